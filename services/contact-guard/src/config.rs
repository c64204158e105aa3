// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact form guard.
//!
//! Every value has a default matching the behaviour of the public contact
//! form; `Config::from_env` overlays environment variables on top.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Longest accepted rate window: one year.
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration for the contact guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed to post the form cross-origin (default: none)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Submission heuristics configuration
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Outbound email configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limiting per client identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum accepted submissions per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Sweep expired records every N checks, 0 disables (default: 10)
    #[serde(default = "default_sweep_every")]
    pub sweep_every: u64,

    /// Background sweep interval in seconds (default: 60)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Heuristics applied to the submitted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Minimum time between form render and submit (default: 2000)
    #[serde(default = "default_min_elapsed_ms")]
    pub min_elapsed_ms: i64,

    /// Per-field character cap applied during sanitization (default: 5000)
    #[serde(default = "default_max_field_chars")]
    pub max_field_chars: usize,

    /// More URLs than this marks a message as spam (default: 3)
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,
}

/// Resend API settings and the fixed envelope of relayed messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Resend API key; sends fail with `NotConfigured` while empty
    #[serde(default)]
    pub api_key: String,

    /// Resend API base URL (default: https://api.resend.com)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Sender display name and address
    #[serde(default = "default_from")]
    pub from: String,

    /// Single recipient of every relayed message
    #[serde(default = "default_to")]
    pub to: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60 * 60
}

fn default_sweep_every() -> u64 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_min_elapsed_ms() -> i64 {
    2000 // the form itself holds submit back for 3000
}

fn default_max_field_chars() -> usize {
    5000
}

fn default_max_urls() -> usize {
    3
}

fn default_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_from() -> String {
    "Contact <onboarding@resend.dev>".to_string()
}

fn default_to() -> String {
    "contact@localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            submission: SubmissionConfig::default(),
            email: EmailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_every: default_sweep_every(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            min_elapsed_ms: default_min_elapsed_ms(),
            max_field_chars: default_max_field_chars(),
            max_urls: default_max_urls(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
            from: default_from(),
            to: default_to(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration, capped at [`MAX_WINDOW_SECS`]
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs.min(MAX_WINDOW_SECS))
    }

    /// Get the background sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl EmailConfig {
    /// Whether an API key has been supplied.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Full URL of the send-email endpoint.
    pub fn send_url(&self) -> anyhow::Result<Url> {
        let mut base = Url::parse(&self.api_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("unsupported email API scheme: {}", base.scheme());
        }
        // Without a trailing slash `join` would replace the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join("emails")?)
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit: RateLimitConfig {
                max_requests: parse_var(&lookup, "RATE_LIMIT_MAX")
                    .unwrap_or(defaults.rate_limit.max_requests),
                window_secs: parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or(defaults.rate_limit.window_secs),
                sweep_every: parse_var(&lookup, "SWEEP_EVERY")
                    .unwrap_or(defaults.rate_limit.sweep_every),
                sweep_interval_secs: parse_var(&lookup, "SWEEP_INTERVAL_SECS")
                    .unwrap_or(defaults.rate_limit.sweep_interval_secs),
            },
            submission: SubmissionConfig {
                min_elapsed_ms: parse_var(&lookup, "MIN_ELAPSED_MS")
                    .unwrap_or(defaults.submission.min_elapsed_ms),
                ..defaults.submission
            },
            email: EmailConfig {
                api_key: lookup("RESEND_API_KEY").unwrap_or_default(),
                api_url: lookup("RESEND_API_URL").unwrap_or(defaults.email.api_url),
                from: lookup("CONTACT_FROM").unwrap_or(defaults.email.from),
                to: lookup("CONTACT_TO").unwrap_or(defaults.email.to),
            },
            metrics: MetricsConfig {
                enabled: parse_var(&lookup, "METRICS_ENABLED").unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
