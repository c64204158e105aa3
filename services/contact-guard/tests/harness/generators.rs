// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for abuse simulation.

use chrono::{DateTime, Utc};
use contact_guard::Submission;

/// Generate a pool of client identities in the 10.x.x.x range.
pub fn generate_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = (i >> 16) & 0xFF;
            let b = (i >> 8) & 0xFF;
            let c = i & 0xFF;
            format!("10.{}.{}.{}", a, b, c)
        })
        .collect()
}

/// What kind of submission a simulated client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// A person who waited before pressing send
    Human,
    /// Fills every input, including the hidden one
    HoneypotFiller,
    /// Posts the instant the form renders
    Instant,
    /// Pastes a block of links
    LinkSpammer,
    /// Posts with fields left blank
    Blank,
}

/// Build a submission for `behaviour` as if sent at `now`.
pub fn submission(behaviour: Behaviour, index: usize, now: DateTime<Utc>) -> Submission {
    let ts = |ago_ms: i64| Some((now.timestamp_millis() - ago_ms).to_string());

    let human = Submission {
        name: format!("Visitor {}", index),
        email: format!("visitor{}@example.com", index),
        message: "I would like to ask about a print.".to_string(),
        honeypot: String::new(),
        timestamp: ts(15_000),
    };

    match behaviour {
        Behaviour::Human => human,
        Behaviour::HoneypotFiller => Submission {
            honeypot: format!("https://seo-{}.example", index),
            ..human
        },
        Behaviour::Instant => Submission {
            timestamp: ts(150),
            ..human
        },
        Behaviour::LinkSpammer => Submission {
            message: link_block(5),
            ..human
        },
        Behaviour::Blank => Submission {
            name: String::new(),
            ..human
        },
    }
}

/// A message body with `n` distinct links.
pub fn link_block(n: usize) -> String {
    (0..n)
        .map(|i| format!("https://cheap-{}.example/deal", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Markup payloads and what sanitization leaves of them.
pub fn markup_payloads() -> Vec<(&'static str, &'static str)> {
    vec![
        ("<script>alert(1)</script>Bob", "alert(1)Bob"),
        ("<img src=x onerror=alert(1)>", ""),
        ("<a href=\"javascript:alert(1)\">hi</a>", "hi"),
        ("<<b>>nested", "nested"),
        ("5 > 3", "5  3"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(300);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 300);
    }

    #[test]
    fn test_link_block() {
        assert_eq!(link_block(2).matches("https://").count(), 2);
    }
}
