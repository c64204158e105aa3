// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the contact endpoint.

use crate::error::GuardError;
use crate::guard::{BotSignal, Outcome};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Counters exposed on the metrics endpoint.
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    tracked_clients: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by outcome",
            ),
            &["outcome"],
        )?;
        let tracked_clients = IntGauge::new(
            "contact_rate_limit_records",
            "Client identities currently held by the rate limiter",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;

        Ok(Self {
            registry,
            submissions,
            tracked_clients,
        })
    }

    /// Count one request by how the guard resolved it.
    pub fn observe(&self, result: &Result<Outcome, GuardError>) {
        let label = match result {
            Ok(Outcome::Sent) => "sent",
            Ok(Outcome::Dropped(BotSignal::Honeypot)) => "bot_honeypot",
            Ok(Outcome::Dropped(BotSignal::TooFast { .. })) => "bot_timing",
            Err(GuardError::RateLimited { .. }) => "rate_limited",
            Err(GuardError::Invalid(_)) => "invalid",
            Err(GuardError::SendFailed(_)) => "send_failed",
        };
        self.submissions.with_label_values(&[label]).inc();
    }

    pub fn count(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    pub fn set_tracked_clients(&self, n: usize) {
        self.tracked_clients.set(n as i64);
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::error!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
