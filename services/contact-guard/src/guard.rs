// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission guard: ordered abuse checks in front of a single send.
//!
//! Checks run in this order and stop at the first failure:
//!
//! 1. Per-client rate limit
//! 2. Honeypot field
//! 3. Render-to-submit timing
//! 4. Required fields
//! 5. Sanitization
//! 6. Email format
//! 7. Suspicious content
//!
//! Honeypot and timing hits report success without sending anything, so a
//! bot cannot tell a dropped submission from a delivered one.

use crate::config::{EmailConfig, SubmissionConfig};
use crate::error::GuardError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::{EmailSender, OutboundEmail};
use crate::validator::{RawFields, SanitizedSubmission, SubmissionValidator};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A contact form submission as posted by the browser.
///
/// Fields missing from the form are left empty.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
    /// Hidden field humans never fill in (wire name `website`)
    pub honeypot: String,
    /// Render time in milliseconds since the epoch (wire name `_timestamp`)
    pub timestamp: Option<String>,
}

impl Submission {
    /// Build a submission from decoded form pairs in body order.
    ///
    /// The first occurrence of a field wins; repeats are ignored, so a filled
    /// honeypot cannot be masked by a later empty one.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::default();
        let mut seen = HashSet::new();
        for (name, value) in fields {
            let name = name.as_ref();
            if seen.insert(name.to_string()) {
                submission.set_field(name, value.into());
            }
        }
        submission
    }

    /// Assign a form field by its wire name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "email" => self.email = value,
            "message" => self.message = value,
            "website" => self.honeypot = value,
            "_timestamp" => self.timestamp = Some(value),
            _ => {}
        }
    }

    fn raw_fields(&self) -> RawFields<'_> {
        RawFields {
            name: &self.name,
            email: &self.email,
            message: &self.message,
        }
    }
}

/// Why a submission was taken for automated traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSignal {
    /// The honeypot field was filled in
    Honeypot,
    /// Submitted sooner after render than a person could
    TooFast { elapsed_ms: i64 },
}

impl std::fmt::Display for BotSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Honeypot => write!(f, "honeypot filled"),
            Self::TooFast { elapsed_ms } => write!(f, "submitted after {}ms", elapsed_ms),
        }
    }
}

/// Successful outcome of a guarded submission. Both variants are reported to
/// the client identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was handed to the email service
    Sent,
    /// Suspected bot; nothing was sent
    Dropped(BotSignal),
}

/// Ordered checklist plus dispatch.
pub struct SubmissionGuard {
    limiter: RateLimiter,
    validator: SubmissionValidator,
    mailer: Arc<dyn EmailSender>,
    submission: SubmissionConfig,
    email: EmailConfig,
}

impl SubmissionGuard {
    pub fn new(
        limiter: RateLimiter,
        submission: SubmissionConfig,
        email: EmailConfig,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            limiter,
            validator: SubmissionValidator::new(submission.clone()),
            mailer,
            submission,
            email,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run the full checklist for `identity` at the current time.
    pub async fn handle(
        &self,
        identity: &str,
        submission: &Submission,
    ) -> Result<Outcome, GuardError> {
        self.handle_at(identity, submission, Utc::now()).await
    }

    /// Run the full checklist for `identity` at `now`.
    pub async fn handle_at(
        &self,
        identity: &str,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<Outcome, GuardError> {
        self.check_rate_at(identity, now).await?;
        self.process_at(identity, submission, now).await
    }

    /// Step 1 only. Counts the request against `identity`.
    pub async fn check_rate_at(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GuardError> {
        match self.limiter.check_at(identity, now).await {
            RateLimitResult::Allowed { remaining, .. } => {
                debug!(identity, remaining, "Rate limit passed");
                Ok(())
            }
            RateLimitResult::Limited { retry_after } => {
                info!(
                    identity,
                    retry_after_secs = retry_after.as_secs(),
                    "Submission rate limited"
                );
                Err(GuardError::RateLimited { retry_after })
            }
        }
    }

    /// Steps 2 to 7 and dispatch, for a request that already passed the
    /// rate limit.
    pub async fn process_at(
        &self,
        identity: &str,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<Outcome, GuardError> {
        if let Some(signal) = self.screen(submission, now) {
            info!(identity, signal = %signal, "Dropping suspected bot submission");
            return Ok(Outcome::Dropped(signal));
        }

        let sanitized = self
            .validator
            .validate(&submission.raw_fields())
            .map_err(|err| {
                info!(identity, error = %err, "Submission rejected");
                GuardError::Invalid(err)
            })?;

        let email = self.compose(&sanitized);
        if let Err(err) = self.mailer.send(&email).await {
            error!(identity, error = %err, "Failed to send email");
            return Err(GuardError::SendFailed(err));
        }

        Ok(Outcome::Sent)
    }

    /// Honeypot and timing heuristics.
    pub fn screen(&self, submission: &Submission, now: DateTime<Utc>) -> Option<BotSignal> {
        if !submission.honeypot.is_empty() {
            return Some(BotSignal::Honeypot);
        }

        // No leading digits skips the check rather than failing it
        let rendered_at = submission.timestamp.as_deref().and_then(leading_integer)?;

        let elapsed_ms = now.timestamp_millis().saturating_sub(rendered_at);
        if elapsed_ms < self.submission.min_elapsed_ms {
            return Some(BotSignal::TooFast { elapsed_ms });
        }

        None
    }

    /// Build the relayed message from sanitized fields.
    pub fn compose(&self, sanitized: &SanitizedSubmission) -> OutboundEmail {
        OutboundEmail {
            from: self.email.from.clone(),
            to: vec![self.email.to.clone()],
            subject: format!("New message from {}", sanitized.name),
            reply_to: sanitized.email.clone(),
            text: sanitized.message.clone(),
        }
    }
}

/// Read the optionally signed run of digits at the start of `raw`, ignoring
/// anything after it. Out-of-range values saturate.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }

    let value = digits[..len].bytes().try_fold(0i64, |acc, b| {
        let digit = i64::from(b - b'0');
        let next = acc.checked_mul(10)?;
        if negative {
            next.checked_sub(digit)
        } else {
            next.checked_add(digit)
        }
    });

    Some(value.unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}
