use validator::ValidationError;

const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890", "qwerty123",
    "qwertyuiop", "iloveyou", "sunshine", "princess", "football", "baseball", "welcome1",
    "abc12345", "letmein1", "trustno1", "superman", "dragon12", "monkey12", "admin123",
    "passw0rd", "11111111", "00000000", "asdfghjk", "zxcvbnm1",
];

/// Letters, digits and `@ . + - _` only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_chars");
        err.message = Some(
            "Username may contain only letters, numbers, and @/./+/-/_ characters".into(),
        );
        Err(err)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordWeakness {
    #[error("This password is too short. It must contain at least 8 characters.")]
    TooShort,
    #[error("This password is entirely numeric.")]
    EntirelyNumeric,
    #[error("This password is too common.")]
    TooCommon,
    #[error("The password is too similar to the {0}.")]
    TooSimilar(&'static str),
}

/// Personal details a password must not resemble.
pub struct PasswordContext<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

pub fn check_password(password: &str, ctx: &PasswordContext<'_>) -> Result<(), PasswordWeakness> {
    let lowered = password.to_lowercase();

    let email_local = ctx.email.split('@').next().unwrap_or_default();
    let attributes = [
        ("username", ctx.username),
        ("email address", email_local),
        ("first name", ctx.first_name),
        ("last name", ctx.last_name),
    ];
    for (label, value) in attributes {
        let value = value.trim().to_lowercase();
        if value.len() >= 3 && (lowered.contains(&value) || value.contains(&lowered)) {
            return Err(PasswordWeakness::TooSimilar(label));
        }
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordWeakness::TooShort);
    }

    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(PasswordWeakness::TooCommon);
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(PasswordWeakness::EntirelyNumeric);
    }

    Ok(())
}
