// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for scheduler-triggered `/tasks/*` routes.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the cron secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Secret presented by the caller, from `x-cron-secret` or a Bearer token.
fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(CRON_SECRET_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(value);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Constant-time comparison of the presented and configured secrets.
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Require the configured cron secret. With no secret configured the
/// routes are closed.
pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        tracing::warn!("Blocked tasks request: CRON_SECRET not configured");
        return Err(StatusCode::FORBIDDEN);
    };

    match presented_secret(request.headers()) {
        Some(presented) if secret_matches(presented, expected) => {
            tracing::debug!(path = %request.uri().path(), "Cron secret verified");
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!("Blocked tasks request: wrong cron secret");
            Err(StatusCode::FORBIDDEN)
        }
        None => {
            tracing::warn!("Blocked tasks request: missing cron secret");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
