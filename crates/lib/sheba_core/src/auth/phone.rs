//! Bangladeshi mobile number validation.

use std::sync::LazyLock;

use regex::Regex;

/// Bangladeshi mobile format: leading "+8801" or "01", then 9 digits.
static BD_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((\+8801|01)[0-9]{9})$").expect("valid phone regex"));

/// Whether `phone` is a valid Bangladeshi mobile number.
pub fn is_valid_bd_phone(phone: &str) -> bool {
    BD_PHONE_RE.is_match(phone)
}
