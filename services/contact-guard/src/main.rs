// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Guard Service
//!
//! Serves the contact form endpoint of the personal site and relays
//! accepted messages through the Resend API.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `ALLOWED_ORIGINS`: Comma-separated origins allowed to post the form
//! - `RATE_LIMIT_MAX`: Submissions per window per client (default: 5)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 3600)
//! - `SWEEP_EVERY`: Sweep expired records every N checks (default: 10)
//! - `SWEEP_INTERVAL_SECS`: Background sweep interval (default: 60)
//! - `MIN_ELAPSED_MS`: Minimum render-to-submit time (default: 2000)
//! - `RESEND_API_KEY`, `RESEND_API_URL`: Email API credentials and base URL
//! - `CONTACT_FROM`, `CONTACT_TO`: Sender and recipient of relayed messages
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)

use axum::http::{self, HeaderValue};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_guard::{
    config::Config,
    guard::SubmissionGuard,
    handlers::{router, AppState},
    limiter::RateLimiter,
    mailer::ResendMailer,
    metrics::Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        min_elapsed_ms = config.submission.min_elapsed_ms,
        "Starting contact guard"
    );

    let mailer = Arc::new(ResendMailer::new(&config.email)?);
    let limiter = RateLimiter::new(config.rate_limit.clone());
    let guard = SubmissionGuard::new(
        limiter,
        config.submission.clone(),
        config.email.clone(),
        mailer,
    );

    let state = Arc::new(AppState {
        guard,
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    // Time-driven sweep, independent of request traffic
    let cleanup_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let removed = cleanup_state.guard.limiter().cleanup().await;
            if removed > 0 {
                debug!(removed, "Background sweep removed expired records");
            }
        }
    });

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE]);

    let app = router(state).layer(cors);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
