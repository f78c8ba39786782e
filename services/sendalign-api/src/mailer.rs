// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! MailerLite subscriber client.
//!
//! Waitlist signups are created (or updated, MailerLite upserts on email)
//! with a single `POST /api/subscribers` that also attaches the waitlist
//! group.

use crate::config::MailerConfig;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("MailerLite is not configured")]
    NotConfigured,

    /// Non-2xx answer; carries the response body when there is one.
    #[error("{}", rejected_message(.body))]
    Rejected { status: u16, body: String },

    #[error("MailerLite request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

fn rejected_message(body: &str) -> &str {
    if body.is_empty() {
        "MailerLite error"
    } else {
        body
    }
}

#[derive(Debug, Serialize)]
struct CreateSubscriber<'a> {
    email: &'a str,
    groups: [&'a str; 1],
}

/// MailerLite API client
pub struct MailerClient {
    base_url: String,
    api_key: String,
    group_id: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for MailerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerClient")
            .field("base_url", &self.base_url)
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

impl MailerClient {
    /// Create a client, or `NotConfigured` when the key or group is unset.
    pub fn from_config(config: &MailerConfig) -> Result<Self, MailerError> {
        let (Some(api_key), Some(group_id)) = (&config.api_key, &config.group_id) else {
            return Err(MailerError::NotConfigured);
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            group_id: group_id.clone(),
            client,
        })
    }

    /// Add `email` to the waitlist group.
    pub async fn subscribe(&self, email: &str) -> Result<(), MailerError> {
        let url = format!("{}/api/subscribers", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateSubscriber {
                email,
                groups: [self.group_id.as_str()],
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Subscriber accepted by MailerLite");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "MailerLite rejected subscriber");
        Err(MailerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
