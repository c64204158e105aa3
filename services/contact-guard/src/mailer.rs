// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound email delivery.
//!
//! The guard only depends on [`EmailSender`]; [`ResendMailer`] is the
//! production implementation on top of the Resend HTTP API.

use crate::config::EmailConfig;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// A fully composed message for the configured recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub reply_to: String,
    pub text: String,
}

/// Email delivery errors.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Email API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Something that can deliver an [`OutboundEmail`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError>;
}

/// Resend API client.
pub struct ResendMailer {
    endpoint: Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ResendMailer {
    /// Build a client from configuration. A missing API key is not an error
    /// here; every send fails with [`MailerError::NotConfigured`] instead.
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let endpoint = config.send_url()?;
        let api_key = if config.is_configured() {
            info!(endpoint = %endpoint, "Email delivery configured");
            Some(config.api_key.clone())
        } else {
            warn!("RESEND_API_KEY not set, contact messages cannot be delivered");
            None
        };

        Ok(Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let api_key = self.api_key.as_deref().ok_or(MailerError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(subject = %email.subject, "Contact message delivered");
        Ok(())
    }
}
