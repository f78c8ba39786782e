// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for attack simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate a pool of subscriber addresses.
pub fn generate_emails(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("subscriber-{i}@list-{}.example.com", i % 3))
        .collect()
}

/// Deterministic 64-character hex strings that are not valid signatures.
pub fn forged_signature(seed: usize) -> String {
    let mut state = (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..32)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            format!("{:02x}", state as u8)
        })
        .collect()
}

/// Percent-encode an address for a query string.
pub fn encode_email(email: &str) -> String {
    url::form_urlencoded::byte_serialize(email.as_bytes()).collect()
}

/// Query strings with one or more required parameters missing or broken.
pub fn generate_truncated_queries() -> Vec<&'static str> {
    vec![
        "",
        "?email=a%40example.com",
        "?email=a%40example.com&t=1700000000000",
        "?t=1700000000000&sig=00",
        "?email=a%40example.com&t=&sig=00",
        "?email=a%40example.com&t=0&sig=00",
        "?email=a%40example.com&t=yesterday&sig=00",
        "?email=&t=1700000000000&sig=00",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_forged_signature_shape() {
        let sig = forged_signature(7);
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, forged_signature(8));
    }
}
