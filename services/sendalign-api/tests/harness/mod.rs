// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack simulation against the unsubscribe endpoints.
//!
//! Requests go through the real router; time is a manual clock advanced
//! per request, so runs are deterministic and do not sleep.

pub mod attacks;
pub mod generators;
pub mod metrics;
