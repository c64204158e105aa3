// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact form submission validator.
//!
//! Implements the content checks run after the abuse heuristics:
//! - Required field presence
//! - Sanitization (trim, length cap, markup stripping)
//! - Email format validation
//! - Suspicious content filtering
//!
//! The suspicious-content filter sees sanitized text, so markup that
//! sanitization already removed cannot trigger it.

use crate::config::SubmissionConfig;
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing fields")]
    MissingFields,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Message contains suspicious content")]
    SuspiciousContent(SuspiciousReason),
}

/// Which signal tripped the suspicious-content filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspiciousReason {
    ScriptTag,
    JavascriptScheme,
    EventHandler,
    TooManyUrls(usize),
}

impl std::fmt::Display for SuspiciousReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScriptTag => write!(f, "script tag"),
            Self::JavascriptScheme => write!(f, "javascript: scheme"),
            Self::EventHandler => write!(f, "inline event handler"),
            Self::TooManyUrls(n) => write!(f, "{} URLs", n),
        }
    }
}

/// Raw form fields as received.
#[derive(Debug, Clone, Copy)]
pub struct RawFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub message: &'a str,
}

/// Fields after sanitization, ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact form content validator.
pub struct SubmissionValidator {
    config: SubmissionConfig,
    tag: Regex,
    email: Regex,
    url: Regex,
    blocked: Vec<(Regex, SuspiciousReason)>,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: SubmissionConfig) -> Self {
        Self {
            config,
            tag: compile("<[^>]*>", false),
            email: compile(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", false),
            url: compile(r"https?://\S+", true),
            blocked: vec![
                (compile("<script", true), SuspiciousReason::ScriptTag),
                (compile("javascript:", true), SuspiciousReason::JavascriptScheme),
                (compile("onclick|onerror", true), SuspiciousReason::EventHandler),
            ],
        }
    }

    /// All three fields must be non-empty once trimmed.
    pub fn check_required(&self, fields: &RawFields<'_>) -> Result<(), ValidationError> {
        let missing = [fields.name, fields.email, fields.message]
            .iter()
            .any(|f| f.trim().is_empty());

        if missing {
            debug!("Missing required field");
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }

    /// Trim, cap to `max_field_chars` characters, then strip tags and any
    /// leftover angle brackets.
    pub fn sanitize(&self, input: &str) -> String {
        let capped: String = input
            .trim()
            .chars()
            .take(self.config.max_field_chars)
            .collect();

        self.tag
            .replace_all(&capped, "")
            .chars()
            .filter(|c| !matches!(c, '<' | '>'))
            .collect()
    }

    /// Sanitize every field of a submission.
    pub fn sanitize_fields(&self, fields: &RawFields<'_>) -> SanitizedSubmission {
        SanitizedSubmission {
            name: self.sanitize(fields.name),
            email: self.sanitize(fields.email),
            message: self.sanitize(fields.message),
        }
    }

    /// Loose `local@domain.tld` shape check.
    pub fn validate_email(&self, email: &str) -> Result<(), ValidationError> {
        if self.email.is_match(email) {
            Ok(())
        } else {
            debug!(email = %email, "Invalid email format");
            Err(ValidationError::InvalidEmail)
        }
    }

    /// Find the first spam or injection signal in `text`.
    pub fn suspicious_reason(&self, text: &str) -> Option<SuspiciousReason> {
        if let Some((_, reason)) = self.blocked.iter().find(|(re, _)| re.is_match(text)) {
            return Some(*reason);
        }

        let urls = self.url.find_iter(text).count();
        if urls > self.config.max_urls {
            return Some(SuspiciousReason::TooManyUrls(urls));
        }

        None
    }

    /// Check name and message together for suspicious content.
    pub fn check_content(&self, submission: &SanitizedSubmission) -> Result<(), ValidationError> {
        let full = format!("{} {}", submission.name, submission.message);
        match self.suspicious_reason(&full) {
            Some(reason) => {
                debug!(reason = %reason, "Suspicious content detected");
                Err(ValidationError::SuspiciousContent(reason))
            }
            None => Ok(()),
        }
    }

    /// Run required-field, sanitization, email and content checks in order.
    pub fn validate(&self, fields: &RawFields<'_>) -> Result<SanitizedSubmission, ValidationError> {
        self.check_required(fields)?;
        let sanitized = self.sanitize_fields(fields);
        self.validate_email(&sanitized.email)?;
        self.check_content(&sanitized)?;
        Ok(sanitized)
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}
