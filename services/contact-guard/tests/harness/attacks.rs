// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Abuse patterns for security testing.

use super::generators::Behaviour;
use std::time::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Simulated time between consecutive submissions
    pub interval: Duration,
    /// Number of unique client identities
    pub unique_ips: usize,
    /// What every submission looks like
    pub behaviour: Behaviour,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            interval: Duration::from_millis(100),
            unique_ips: 1,
            behaviour: Behaviour::Human,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client hammering the form.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Many clients, a handful of submissions each.
    pub fn distributed_attack() -> Self {
        Self {
            total_requests: 600,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Bots that fill the hidden field.
    pub fn honeypot_bots() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 25,
            behaviour: Behaviour::HoneypotFiller,
            ..Default::default()
        }
    }

    /// Scripts posting straight after render.
    pub fn instant_submitters() -> Self {
        Self {
            total_requests: 50,
            unique_ips: 25,
            behaviour: Behaviour::Instant,
            ..Default::default()
        }
    }

    /// Link spam from a rotating pool.
    pub fn link_spam() -> Self {
        Self {
            total_requests: 40,
            unique_ips: 20,
            behaviour: Behaviour::LinkSpammer,
            ..Default::default()
        }
    }

    /// One client posting every 20 minutes for a day.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 72,
            interval: Duration::from_secs(20 * 60),
            ..Default::default()
        }
    }

    /// Simulated span of the whole attack.
    pub fn expected_duration(&self) -> Duration {
        self.interval * self.total_requests as u32
    }
}
