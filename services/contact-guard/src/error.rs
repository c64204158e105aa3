// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Guard errors and their HTTP mapping.

use crate::mailer::MailerError;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Reasons a submission was refused.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Provider detail stays in the logs; clients only see the generic text.
    #[error("Failed to send email")]
    SendFailed(#[source] MailerError),
}

impl GuardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::SendFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        match self {
            Self::RateLimited { retry_after } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs(retry_after).to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

/// Whole seconds for `Retry-After`, rounded up so a client never retries early.
fn retry_after_secs(retry_after: Duration) -> u64 {
    retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)
}
