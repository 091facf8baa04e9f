use serde::Serialize;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Oversized requests are clamped rather than refused.
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Self {
        let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Page { number: page.unwrap_or(1).max(1), size }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    fn last_page(&self, count: i64) -> u32 {
        if count <= 0 {
            return 1;
        }
        let size = i64::from(self.size);
        ((count + size - 1) / size) as u32
    }

    pub fn is_out_of_range(&self, count: i64) -> bool {
        self.number > self.last_page(count)
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(page: Page, count: i64, results: Vec<T>) -> Self {
        let next = (page.number < page.last_page(count)).then(|| page.number + 1);
        let previous = (page.number > 1).then(|| page.number - 1);
        Paginated { count, next, previous, results }
    }

    pub fn empty() -> Self {
        Paginated { count: 0, next: None, previous: None, results: Vec::new() }
    }
}
