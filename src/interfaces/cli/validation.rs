//! Input checks applied before a request reaches the orchestrator.

#![deny(clippy::invalid_regex)]

use crate::domain::payment::{Amount, GatewayType};
use crate::error::{PaymentError, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::error;

/// Optional `+`, then 10 to 15 digits.
static PHONE_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"^[+]?[0-9]{10,15}$"));

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r"^(?i)[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
});

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            error!(%error, pattern, "Invalid validation pattern");
            None
        }
    }
}

fn is_match(regex: &LazyLock<Option<Regex>>, value: &str) -> Result<bool> {
    match regex.as_ref() {
        Some(regex) => Ok(regex.is_match(value)),
        None => Err(PaymentError::Config("Invalid regex expression".to_string())),
    }
}

pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PaymentError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn amount(value: i64) -> Result<Amount> {
    Amount::new(value)
}

pub fn phone(value: &str) -> Result<&str> {
    let trimmed = value.trim();
    if is_match(&PHONE_REGEX, trimmed)? {
        Ok(trimmed)
    } else {
        Err(PaymentError::ValidationError(
            "Invalid phone number format".to_string(),
        ))
    }
}

pub fn email(value: &str) -> Result<&str> {
    let trimmed = value.trim();
    if is_match(&EMAIL_REGEX, trimmed)? {
        Ok(trimmed)
    } else {
        Err(PaymentError::ValidationError(
            "Invalid email format".to_string(),
        ))
    }
}

/// Accepts only known gateway names; absent stays absent so the default applies.
pub fn gateway(value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(token) => {
            let gateway_type = token.parse::<GatewayType>().map_err(|_| {
                PaymentError::ValidationError(
                    "Gateway type must be either RAZORPAY or STRIPE".to_string(),
                )
            })?;
            Ok(Some(gateway_type.as_str().to_string()))
        }
        None => Ok(None),
    }
}
