// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SendAlign Common: primitives shared by the SendAlign services
//
// Token stack:
//   MAC:      HMAC-SHA-256, hex encoded
//   Compare:  constant time over decoded bytes
//   Headers:  RFC 8058 one-click unsubscribe

pub mod unsub;

pub use unsub::{SignedToken, TokenSigner, UnsubscribeLink, DEFAULT_SCOPE, DELIMITER};
