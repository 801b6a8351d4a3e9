// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use std::net::Ipv4Addr;

/// Generate a pool of viewer addresses in 10.0.0.0/8.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            Ipv4Addr::new(10, a, b, c).to_string()
        })
        .collect()
}

/// Generate full-form IPv6 viewer addresses.
pub fn generate_ipv6(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("2001:db8:0:0:0:0:{:x}:{:x}", i >> 16, i & 0xFFFF))
        .collect()
}

/// Values that must never become a viewer identifier.
pub fn generate_malformed_ips() -> Vec<&'static str> {
    vec![
        "",
        "unknown",
        "256.1.1.1",
        "1.2.3",
        "1.2.3.4.5",
        "01.2.3.4.",
        "::1",
        "fe80::1",
        "1.2.3.4<script>",
        "1.2.3.4; DROP TABLE emotion_likes",
        "localhost",
        "0x7f.0.0.1",
    ]
}

/// Spellings of valid labels that the exact check must refuse.
pub fn generate_label_variants() -> Vec<&'static str> {
    vec![
        "happy", "HAPPY", "Happy ", " Sad", "Happy\n", "Angr y", "Calm.", "Exc1ted", "Gratefull",
        "Anxious\0", "Bored!", "😀",
    ]
}

/// A message of exactly `chars` characters built from multi-byte text.
pub fn multibyte_message(chars: usize) -> String {
    "ñ😀日".chars().cycle().take(chars).collect()
}
