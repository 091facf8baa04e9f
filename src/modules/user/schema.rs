use sqlx::prelude::FromRow;

#[allow(unused)]
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub hash_password: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
