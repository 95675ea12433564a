use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;

// Invalid limiter settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("rate limit max requests must be greater than 0")]
    ZeroMaxRequests,
    #[error("rate limit window must be greater than 0")]
    ZeroWindow,
    #[error("sweep interval must be greater than 0")]
    ZeroSweepInterval,
    #[error("rate limit window must be at most {0} seconds")]
    WindowTooLarge(u64),
    #[error("sweep interval must be at most {0} seconds")]
    SweepIntervalTooLarge(u64),
}

// Errors returned by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Rate limit exceeded")]
    RateLimited {
        retry_after: Duration,
        reset_at: DateTime<Utc>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Submission queue unavailable")]
    QueueUnavailable,

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Retry-After is whole seconds; round up and never send 0
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::RateLimited {
                retry_after,
                reset_at,
            } => {
                let secs = retry_after_secs(retry_after);
                let status = StatusCode::TOO_MANY_REQUESTS;
                let body = Json(json!({
                    "error": "Rate limit exceeded. Try again later.",
                    "status": status.as_u16(),
                    "retry_after": secs,
                    "reset_at": reset_at.to_rfc3339(),
                }));
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            other => {
                let (status, message) = match &other {
                    AppError::Validation(_) => (StatusCode::BAD_REQUEST, other.to_string()),
                    AppError::QueueUnavailable => {
                        tracing::error!("Submission queue unavailable");
                        (StatusCode::SERVICE_UNAVAILABLE, other.to_string())
                    }
                    AppError::Delivery(reason) => {
                        tracing::warn!(reason = %reason, "Contact delivery failed");
                        (StatusCode::BAD_GATEWAY, "Delivery failed".to_string())
                    }
                    _ => {
                        tracing::error!("Internal error: {:?}", other);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal server error".to_string(),
                        )
                    }
                };

                let body = Json(json!({
                    "error": message,
                    "status": status.as_u16(),
                }));
                (status, body).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3600)), 3600);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let response = AppError::RateLimited {
            retry_after: Duration::from_secs(42),
            reset_at: Utc::now(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn internal_error_hides_details() {
        let response = AppError::Internal("encoder exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn delivery_maps_to_bad_gateway() {
        let response = AppError::Delivery("webhook returned 500".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
