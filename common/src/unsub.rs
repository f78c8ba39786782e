// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signed one-click unsubscribe tokens.
//
// Signed message (UTF-8):
//   <lowercased email> "|" <list id> "|" <issued-at, decimal ms since epoch>
//
// MAC: HMAC-SHA-256 keyed with the server-held secret, hex encoded.
// Headers follow RFC 8058:
//   List-Unsubscribe:      <https://host/api/unsubscribe?email=..&list=..&t=..&sig=..>
//   List-Unsubscribe-Post: List-Unsubscribe=One-Click

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// List id used when the caller does not name one.
pub const DEFAULT_SCOPE: &str = "default";

/// Default verification window, applied symmetrically around "now".
pub const DEFAULT_MAX_SKEW: Duration = Duration::from_secs(24 * 60 * 60);

/// Value of the `List-Unsubscribe-Post` header for one-click endpoints.
pub const ONE_CLICK_POST_VALUE: &str = "List-Unsubscribe=One-Click";

/// Path of the verification endpoint, relative to the site origin.
pub const UNSUBSCRIBE_PATH: &str = "/api/unsubscribe";

/// Field delimiter in the signed message.
///
/// Identities and scopes containing it are ambiguous once joined; callers
/// must reject them before issuing or verifying.
pub const DELIMITER: char = '|';

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsubscribe secret is not configured")]
    MissingSecret,

    #[error("invalid unsubscribe endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// A signed, time-boxed unsubscribe capability.
///
/// Nothing is stored server side; the four fields travel in the link and
/// are checked again by [`TokenSigner::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedToken {
    pub identity: String,
    pub scope: String,
    pub issued_at_ms: i64,
    pub signature: String,
}

/// A fully formed link plus the RFC 8058 header values that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsubscribeLink {
    pub url: String,
    pub list_unsubscribe: String,
    pub list_unsubscribe_post: &'static str,
}

/// Issues and verifies unsubscribe tokens under one secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    max_skew: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("max_skew", &self.max_skew)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer. Fails with [`Error::MissingSecret`] on an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, Error> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
            max_skew: DEFAULT_MAX_SKEW,
        })
    }

    /// Override the verification window.
    pub fn with_max_skew(mut self, max_skew: Duration) -> Self {
        self.max_skew = max_skew;
        self
    }

    pub fn max_skew(&self) -> Duration {
        self.max_skew
    }

    /// Sign `identity` for `scope` at `now_ms`.
    ///
    /// The identity is lowercased before signing; `None` scope becomes
    /// [`DEFAULT_SCOPE`].
    pub fn issue(&self, identity: &str, scope: Option<&str>, now_ms: i64) -> SignedToken {
        let identity = identity.to_lowercase();
        let scope = scope.unwrap_or(DEFAULT_SCOPE).to_string();
        let signature = hex::encode(self.mac(&identity, &scope, now_ms).finalize().into_bytes());

        SignedToken {
            identity,
            scope,
            issued_at_ms: now_ms,
            signature,
        }
    }

    /// Sign and render the link for the endpoint at `endpoint`.
    pub fn issue_link(
        &self,
        endpoint: &Url,
        identity: &str,
        scope: Option<&str>,
        now_ms: i64,
    ) -> (SignedToken, UnsubscribeLink) {
        let token = self.issue(identity, scope, now_ms);
        let link = token.link(endpoint);
        (token, link)
    }

    /// Check a presented token.
    ///
    /// Returns `false` for stale or future-dated timestamps, undecodable hex
    /// and MAC mismatches alike; callers cannot tell these apart.
    pub fn verify(
        &self,
        identity: &str,
        scope: &str,
        issued_at_ms: i64,
        signature: &str,
        now_ms: i64,
    ) -> bool {
        let skew_ms = now_ms.abs_diff(issued_at_ms);
        if u128::from(skew_ms) > self.max_skew.as_millis() {
            debug!(skew_ms, "unsubscribe token outside freshness window");
            return false;
        }

        let Ok(provided) = hex::decode(signature) else {
            debug!("unsubscribe signature is not valid hex");
            return false;
        };

        let identity = identity.to_lowercase();
        // verify_slice compares in constant time and rejects length mismatches
        self.mac(&identity, scope, issued_at_ms)
            .verify_slice(&provided)
            .is_ok()
    }

    /// Verify a previously parsed [`SignedToken`].
    pub fn verify_token(&self, token: &SignedToken, now_ms: i64) -> bool {
        self.verify(
            &token.identity,
            &token.scope,
            token.issued_at_ms,
            &token.signature,
            now_ms,
        )
    }

    fn mac(&self, identity: &str, scope: &str, issued_at_ms: i64) -> HmacSha256 {
        let message = canonical_message(identity, scope, issued_at_ms);
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC-SHA-256 accepts any key length"));
        mac.update(message.as_bytes());
        mac
    }
}

impl SignedToken {
    /// Render the token as a link under `endpoint`, with one-click headers.
    pub fn link(&self, endpoint: &Url) -> UnsubscribeLink {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("email", &self.identity)
            .append_pair("list", &self.scope)
            .append_pair("t", &self.issued_at_ms.to_string())
            .append_pair("sig", &self.signature);

        let url = url.to_string();
        UnsubscribeLink {
            list_unsubscribe: format!("<{url}>"),
            url,
            list_unsubscribe_post: ONE_CLICK_POST_VALUE,
        }
    }
}

/// Build the verification endpoint URL for a site origin.
pub fn endpoint_url(origin: &str) -> Result<Url, Error> {
    Ok(Url::parse(origin)?.join(UNSUBSCRIBE_PATH)?)
}

/// Issue a token with a one-off signer.
pub fn issue(
    identity: &str,
    scope: Option<&str>,
    secret: &str,
    now_ms: i64,
) -> Result<SignedToken, Error> {
    Ok(TokenSigner::new(secret)?.issue(identity, scope, now_ms))
}

/// Verify a token with a one-off signer using [`DEFAULT_MAX_SKEW`].
pub fn verify(
    identity: &str,
    scope: &str,
    issued_at_ms: i64,
    signature: &str,
    secret: &str,
    now_ms: i64,
) -> Result<bool, Error> {
    Ok(TokenSigner::new(secret)?.verify(identity, scope, issued_at_ms, signature, now_ms))
}

fn canonical_message(identity: &str, scope: &str, issued_at_ms: i64) -> String {
    format!("{identity}{DELIMITER}{scope}{DELIMITER}{issued_at_ms}")
}
