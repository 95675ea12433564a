use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use crate::error::{AppError, Result};
use crate::metrics::{RATE_LIMITED, RATE_LIMIT_ENTRIES, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ContactRequest, ContactResponse, QueuedSubmission};
use crate::state::AppState;

// Rate limit key for a request; proxy headers only count when trusted
pub fn client_identifier(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return format!("ip:{}", ip);
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = real_ip {
            return format!("ip:{}", ip);
        }
    }

    format!("ip:{}", peer.ip())
}

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    // every attempt counts, even ones that fail validation
    let identifier = client_identifier(&headers, peer, state.trust_forwarded_for);
    let decision = state.rate_limiter.check(&identifier);
    RATE_LIMIT_ENTRIES.set(state.rate_limiter.len() as f64);

    if !decision.allowed {
        RATE_LIMITED.inc();
        let retry_after = decision
            .retry_after(state.rate_limiter.now())
            .unwrap_or_default();
        let reset_at = chrono::Utc::now()
            + chrono::TimeDelta::from_std(retry_after).unwrap_or(chrono::TimeDelta::zero());

        tracing::warn!(
            identifier = %identifier,
            limit = decision.limit,
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded"
        );
        return Err(AppError::RateLimited { retry_after, reset_at });
    }

    let payload: ContactRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("invalid JSON body: {}", e)))?;
    payload.validate().map_err(AppError::Validation)?;

    let (response_tx, response_rx) = oneshot::channel();
    let queued = QueuedSubmission {
        request: payload,
        identifier: identifier.clone(),
        response_tx,
    };

    state.submit_tx.send(queued).await
        .map_err(|_| AppError::QueueUnavailable)?;

    response_rx.await
        .map_err(|_| AppError::QueueUnavailable)?
        .map_err(AppError::Delivery)?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    tracing::info!(identifier = %identifier, remaining = decision.remaining, "Contact submission accepted");

    let mut response = Json(ContactResponse {
        status: "accepted".to_string(),
        remaining: decision.remaining,
    })
    .into_response();

    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(decision.limit));
    headers.insert(HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from(decision.remaining));

    Ok(response)
}
