// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the SendAlign API and their HTTP mapping.

use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required secret or key is missing from the deployment.
    #[error("Server not configured: {0}")]
    Configuration(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Signature mismatch or token outside the verification window.
    #[error("Invalid signature")]
    Authentication,

    /// Token verified but is older than the link TTL.
    #[error("Link expired")]
    Expired,

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    /// The email-marketing provider rejected the request.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Upstream(_) => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Expired => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "NOT_CONFIGURED",
            Self::Validation(_) => "INVALID_REQUEST",
            Self::Authentication => "INVALID_SIGNATURE",
            Self::Expired => "LINK_EXPIRED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Upstream(_) => "UPSTREAM_REJECTED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after_secs = match &self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let body = Json(ErrorResponse {
            ok: false,
            error: self.to_string(),
            code: self.code(),
            retry_after_secs,
        });

        match retry_after_secs {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
