use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::errors::ServiceError;
use crate::rate_limiter::{ClientIp, RateLimiter};
use crate::{ApiResponse, PaginatedResponse};

const MAX_PAGE_SIZE: u64 = 100;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Count one request for `operation` from this client and reject it when the
/// window's ceiling has been reached. First stage of every public mutation
/// pipeline; nothing else runs after a deny.
pub async fn enforce_rate_limit(
    limiter: &RateLimiter,
    operation: &str,
    client: &ClientIp,
) -> Result<(), ServiceError> {
    let decision = limiter.check(operation, &client.0).await;
    if decision.allowed {
        Ok(())
    } else {
        Err(ServiceError::RateLimited {
            retry_after_ms: decision.retry_after_ms(),
        })
    }
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Zero-based offset for the current page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit()
    }

    pub fn paginate<T>(&self, items: Vec<T>, total: u64) -> PaginatedResponse<T> {
        PaginatedResponse::new(items, total, self.page.max(1), self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::rate_limiter::RateLimitConfig;

    #[test]
    fn pagination_offsets() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 20);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams { page: 3, limit: 10 };
        assert_eq!(params.offset(), 20);

        // Oversized limits are clamped.
        let params = PaginationParams {
            page: 1,
            limit: 10_000,
        };
        assert_eq!(params.limit(), 100);
    }

    #[tokio::test]
    async fn enforce_rate_limit_maps_deny_to_error() {
        let limiter = RateLimiter::in_memory(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_secs(60),
            sweep_threshold: 10_000,
        });
        let client = ClientIp("203.0.113.5".to_string());

        assert!(enforce_rate_limit(&limiter, "contact", &client)
            .await
            .is_ok());

        let denied = enforce_rate_limit(&limiter, "contact", &client).await;
        match denied {
            Err(ServiceError::RateLimited { retry_after_ms }) => assert!(retry_after_ms > 0),
            other => panic!("expected rate limit rejection, got {:?}", other.map(|_| ())),
        }
    }
}
