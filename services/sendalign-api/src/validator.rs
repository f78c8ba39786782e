// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request parameter validation.
//!
//! - Email addresses for signups and unsubscribe link issuance
//! - Domain names for the deliverability check
//! - Unsubscribe link query parameters

use sendalign_common::{DEFAULT_SCOPE, DELIMITER};
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Valid email is required")]
    InvalidEmail,

    #[error("Valid domain is required")]
    InvalidDomain,

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Invalid timestamp parameter: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Unsubscribe link parameters after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeParams {
    pub email: String,
    pub list: String,
    pub issued_at_ms: i64,
    pub sig: String,
}

/// Validate and normalize an email address.
///
/// Accepts `local@domain.tld` with no whitespace and a single `@`; the
/// result is trimmed and lowercased.
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();

    let Some((local, domain)) = email.split_once('@') else {
        debug!("Email missing @");
        return Err(ValidationError::InvalidEmail);
    };

    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(|c| c.is_whitespace() || c == DELIMITER)
        && has_inner_dot(domain);

    if !well_formed {
        debug!("Email rejected");
        return Err(ValidationError::InvalidEmail);
    }

    Ok(email.to_lowercase())
}

/// Validate a domain for the deliverability check.
///
/// Letters, digits, dots and hyphens, ending in an alphabetic label of at
/// least two characters.
pub fn validate_domain(raw: &str) -> Result<String, ValidationError> {
    let domain = raw.trim();

    let charset_ok = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

    let tld_ok = match domain.rsplit_once('.') {
        Some((head, tld)) => {
            !head.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    };

    if !(charset_ok && tld_ok) {
        debug!(domain = %domain, "Domain rejected");
        return Err(ValidationError::InvalidDomain);
    }

    Ok(domain.to_string())
}

/// Validate a list id, falling back to the default list when absent or empty.
pub fn validate_list(raw: Option<&str>) -> Result<String, ValidationError> {
    match non_empty(raw) {
        None => Ok(DEFAULT_SCOPE.to_string()),
        Some(list) if list.contains(DELIMITER) => {
            debug!("List id contains the token delimiter");
            Err(ValidationError::InvalidParameter("list"))
        }
        Some(list) => Ok(list.to_string()),
    }
}

/// Validate unsubscribe query parameters.
///
/// `list` falls back to the default list id. `t` must be a non-zero decimal
/// millisecond timestamp.
pub fn validate_unsubscribe_params(
    email: Option<&str>,
    list: Option<&str>,
    t: Option<&str>,
    sig: Option<&str>,
) -> Result<UnsubscribeParams, ValidationError> {
    let email = non_empty(email).ok_or(ValidationError::MissingParameter("email"))?;
    let t = non_empty(t).ok_or(ValidationError::MissingParameter("t"))?;
    let sig = non_empty(sig).ok_or(ValidationError::MissingParameter("sig"))?;
    if email.contains(DELIMITER) {
        return Err(ValidationError::InvalidParameter("email"));
    }
    let list = validate_list(list)?;

    let issued_at_ms = match t.parse::<i64>() {
        Ok(ts) if ts != 0 => ts,
        _ => return Err(ValidationError::InvalidTimestamp(t.to_string())),
    };

    Ok(UnsubscribeParams {
        email: email.to_lowercase(),
        list,
        issued_at_ms,
        sig: sig.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// At least one dot with non-empty labels on both sides of the last one.
fn has_inner_dot(domain: &str) -> bool {
    match domain.rsplit_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}
