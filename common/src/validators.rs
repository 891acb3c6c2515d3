//! Pure input checks shared by registration and the subscription API.
//!
//! None of these panic; a rejected value is reported through the return value.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const INTERVALS: [&str; 2] = ["monthly", "yearly"];

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Checks the `local@domain.tld` shape. No DNS lookup is made.
pub fn validate_email(email: &str) -> bool {
    RE_EMAIL.is_match(email)
}

/// Returns `(valid, reason)`; `reason` is empty for an accepted password.
pub fn validate_password(password: &str) -> (bool, &'static str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return (false, "Password must be at least 6 characters long");
    }
    (true, "")
}

/// Case-sensitive; callers lower-case before asking.
pub fn validate_subscription_interval(interval: &str) -> bool {
    INTERVALS.contains(&interval)
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn validate_date(date: &str) -> (bool, Option<NaiveDate>) {
    let bytes = date.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return (false, None);
    }

    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => (true, Some(parsed)),
        Err(_) => (false, None),
    }
}
