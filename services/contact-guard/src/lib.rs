// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Guard
//!
//! This crate screens contact form submissions before relaying them by
//! email. Checks run in a fixed order and stop at the first failure:
//!
//! - Per-client fixed-window rate limiting (5 per hour default)
//! - Honeypot field (silent drop)
//! - Render-to-submit timing (silent drop under 2s)
//! - Required fields, sanitization and email format
//! - Suspicious content filtering (script markers, link spam)

pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod validator;

pub use config::Config;
pub use error::GuardError;
pub use guard::{BotSignal, Outcome, Submission, SubmissionGuard};
pub use limiter::{MemoryStore, RateLimitRecord, RateLimitResult, RateLimitStore, RateLimiter};
pub use mailer::{EmailSender, MailerError, OutboundEmail, ResendMailer};
pub use validator::{SanitizedSubmission, SubmissionValidator, ValidationError};
