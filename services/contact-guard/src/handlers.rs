// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact guard service.
//!
//! The contact endpoint accepts both `application/x-www-form-urlencoded`
//! and `multipart/form-data` bodies, since browsers post `FormData` as the
//! latter.

use crate::config::Config;
use crate::error::GuardError;
use crate::guard::{Submission, SubmissionGuard};
use crate::identity::client_identity;
use crate::metrics::Metrics;
use crate::validator::ValidationError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;
use url::form_urlencoded;

/// Shared application state.
pub struct AppState {
    pub guard: SubmissionGuard,
    pub metrics: Metrics,
    pub config: Config,
}

/// Body returned for delivered and silently dropped submissions alike.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/contact", post(contact));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics
        .set_tracked_clients(state.guard.limiter().tracked().await);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Contact form submission endpoint.
///
/// The rate limit is checked before the decoded form is used, so a malformed
/// body still counts against the client.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<ContactForm, GuardError>,
) -> Response {
    let identity = client_identity(&headers);
    let now = Utc::now();

    let result = match state.guard.check_rate_at(&identity, now).await {
        Err(err) => Err(err),
        Ok(()) => match body {
            Ok(ContactForm(submission)) => {
                state.guard.process_at(&identity, &submission, now).await
            }
            Err(err) => Err(err),
        },
    };

    state.metrics.observe(&result);

    match result {
        Ok(_) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(err) => err.into_response(),
    }
}

/// A submission decoded from either supported form encoding.
pub struct ContactForm(pub Submission);

#[async_trait]
impl<S> FromRequest<S> for ContactForm
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                debug!(error = %e, "Unreadable multipart body");
                GuardError::Invalid(ValidationError::MissingFields)
            })?;
            return read_multipart(multipart).await.map(ContactForm);
        }

        if !content_type.starts_with("application/x-www-form-urlencoded") {
            debug!(content_type = %content_type, "Unsupported form content type");
            return Err(GuardError::Invalid(ValidationError::MissingFields));
        }

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "Unreadable form body");
            GuardError::Invalid(ValidationError::MissingFields)
        })?;

        Ok(ContactForm(Submission::from_fields(form_urlencoded::parse(&body))))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, GuardError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        debug!(error = %e, "Malformed multipart field");
        GuardError::Invalid(ValidationError::MissingFields)
    };

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(malformed)?;
        fields.push((name, value));
    }
    Ok(Submission::from_fields(fields))
}
