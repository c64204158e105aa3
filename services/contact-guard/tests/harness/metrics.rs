// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for abuse simulation results.

use contact_guard::{BotSignal, GuardError, Outcome as GuardOutcome};
use std::collections::HashMap;

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Sent,
    DroppedHoneypot,
    DroppedTiming,
    RateLimited,
    Invalid,
    SendFailed,
}

impl Outcome {
    pub fn classify(result: &Result<GuardOutcome, GuardError>) -> Self {
        match result {
            Ok(GuardOutcome::Sent) => Self::Sent,
            Ok(GuardOutcome::Dropped(BotSignal::Honeypot)) => Self::DroppedHoneypot,
            Ok(GuardOutcome::Dropped(BotSignal::TooFast { .. })) => Self::DroppedTiming,
            Err(GuardError::RateLimited { .. }) => Self::RateLimited,
            Err(GuardError::Invalid(_)) => Self::Invalid,
            Err(GuardError::SendFailed(_)) => Self::SendFailed,
        }
    }

    /// Whether the client saw a success response.
    pub fn looks_successful(self) -> bool {
        matches!(self, Self::Sent | Self::DroppedHoneypot | Self::DroppedTiming)
    }
}

/// Collects outcomes during an attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    outcomes: HashMap<Outcome, usize>,
    sent_per_ip: HashMap<String, usize>,
    requests_per_ip: HashMap<String, usize>,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        if outcome == Outcome::Sent {
            *self.sent_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        }
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Largest number of delivered messages from one client.
    pub fn max_sent_per_ip(&self) -> usize {
        self.sent_per_ip.values().copied().max().unwrap_or(0)
    }

    /// Share of submissions that did not result in an email.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Sent)) as f64 / total as f64
    }

    /// Share of responses a client would read as success.
    pub fn apparent_success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let ok: usize = self
            .outcomes
            .iter()
            .filter(|(o, _)| o.looks_successful())
            .map(|(_, n)| n)
            .sum();
        ok as f64 / total as f64
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            sent: self.count(Outcome::Sent),
            dropped: self.count(Outcome::DroppedHoneypot) + self.count(Outcome::DroppedTiming),
            rate_limited: self.count(Outcome::RateLimited),
            invalid: self.count(Outcome::Invalid),
            block_rate: self.block_rate(),
            unique_ips: self.requests_per_ip.len(),
            max_sent_per_ip: self.max_sent_per_ip(),
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub sent: usize,
    pub dropped: usize,
    pub rate_limited: usize,
    pub invalid: usize,
    pub block_rate: f64,
    pub unique_ips: usize,
    pub max_sent_per_ip: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Attack Metrics Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Sent:              {}", self.sent)?;
        writeln!(f, "Silently Dropped:  {}", self.dropped)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Invalid:           {}", self.invalid)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips)?;
        writeln!(f, "Max Sent per IP:   {}", self.max_sent_per_ip)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Sent, "10.0.0.1");
        }
        for _ in 0..7 {
            metrics.record(Outcome::RateLimited, "10.0.0.1");
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
        assert!((metrics.apparent_success_rate() - 0.3).abs() < 0.01);
        assert_eq!(metrics.max_sent_per_ip(), 3);
    }
}
