// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Structured log events for the unsubscribe flow.
//!
//! Raw addresses never reach the logs; events carry a SHA-256 digest of the
//! lowercased email so repeated requests can still be correlated.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Hex SHA-256 of an email address.
pub fn email_hash(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

/// Outcome of an unsubscribe attempt, as logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubEvent {
    BadRequest,
    InvalidSignature,
    Expired,
    Ok,
}

impl UnsubEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "unsub_bad_request",
            Self::InvalidSignature => "unsub_invalid_sig",
            Self::Expired => "unsub_expired",
            Self::Ok => "unsub_ok",
        }
    }
}

impl std::fmt::Display for UnsubEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit one unsubscribe event.
pub fn log_unsub(
    event: UnsubEvent,
    ip: &str,
    email: Option<&str>,
    list_id: &str,
    issued_at_ms: Option<i64>,
) {
    let email_hash = email.filter(|e| !e.is_empty()).map(email_hash);
    match event {
        UnsubEvent::Ok => info!(
            event = event.as_str(),
            ip,
            email_hash = ?email_hash,
            list_id,
            "Unsubscribe accepted"
        ),
        _ => warn!(
            event = event.as_str(),
            ip,
            email_hash = ?email_hash,
            list_id,
            ts = ?issued_at_ms,
            "Unsubscribe rejected"
        ),
    }
}
