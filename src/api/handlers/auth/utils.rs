//! Small helpers for auth validation, token generation, and reset links.

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{Datelike, NaiveDate, Utc};
use rand::{RngCore, rngs::OsRng};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt::Write;

const MIN_PASSWORD_LENGTH: usize = 8;
const MIN_PHONE_DIGITS: usize = 10;
const MIN_REGISTRATION_AGE: i32 = 20;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Name must be 2-100 characters after trimming.
pub(super) fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.len() < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }
    if trimmed.len() > 100 {
        return Err("Name must be less than 100 characters".to_string());
    }
    Ok(())
}

/// Password policy: at least 8 characters with one letter and one digit.
pub(super) fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err("Password must contain at least one letter".to_string());
    }
    Ok(())
}

/// Phone numbers must carry at least 10 digits once separators are stripped.
pub(super) fn validate_phone(phone: &str) -> Result<(), String> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if digits < MIN_PHONE_DIGITS {
        return Err("Phone number must be at least 10 digits".to_string());
    }
    Ok(())
}

/// Date of birth must be `YYYY-MM-DD` and at least 20 years in the past.
pub(super) fn validate_date_of_birth(date_of_birth: &str) -> Result<(), String> {
    let Ok(dob) = NaiveDate::parse_from_str(date_of_birth, "%Y-%m-%d") else {
        return Err("Date of birth must be in YYYY-MM-DD format".to_string());
    };
    let today = Utc::now().date_naive();
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    if age < MIN_REGISTRATION_AGE {
        return Err("You must be at least 20 years old to register".to_string());
    }
    Ok(())
}

/// Create a new session token for the bearer header.
/// The raw value is only returned to the client; the database stores a hash.
pub(super) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Create a new password reset token for the emailed deep link.
///
/// Returned token is only sent to the user; we store a hash in the database.
pub(super) fn generate_reset_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a token so raw values never touch the database.
/// The hex digest is used for lookups when the token is presented.
pub(super) fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().fold(
        String::with_capacity(digest.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}

/// Build the deep link included in password reset emails.
pub(super) fn build_reset_link(app_scheme: &str, token: &str) -> String {
    format!("{app_scheme}://reset-password?token={token}")
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
