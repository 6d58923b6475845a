//! Habitara API Library
//!
//! Backend for the Habitara real-estate platform: the public listing site,
//! the owner portal and the agency back office share this one service.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod notifications;
pub mod openapi;
pub mod rate_limiter;
pub mod request_id;
pub mod schema;
pub mod services;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    pub rate_limiter: rate_limiter::RateLimiter,
    pub services: handlers::AppServices,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(limit.max(1))
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The versioned API surface: public site, client portal, back office.
pub fn api_v1_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/properties", get(handlers::properties::list_published))
        .route("/properties/:id", get(handlers::properties::get_published))
        .route("/valuations", post(handlers::leads::submit_valuation))
        .route("/contacts", post(handlers::leads::submit_contact));

    let portal = Router::new()
        .route("/profile", get(handlers::portal::profile))
        .route(
            "/properties",
            get(handlers::portal::list_properties).post(handlers::portal::submit_property),
        )
        .route("/properties/:id", put(handlers::portal::update_property))
        .route("/properties/:id/images", post(handlers::portal::add_image))
        .route(
            "/properties/:id/images/:image_id",
            delete(handlers::portal::remove_image),
        )
        .route(
            "/invoice-requests",
            get(handlers::portal::list_invoice_requests)
                .post(handlers::portal::create_invoice_request),
        );

    let admin = Router::new()
        .route(
            "/properties",
            get(handlers::properties::list_all).post(handlers::properties::create),
        )
        .route(
            "/properties/:id",
            put(handlers::properties::update).delete(handlers::properties::delete),
        )
        .route(
            "/properties/:id/publish",
            post(handlers::properties::publish),
        )
        .route(
            "/properties/:id/unpublish",
            post(handlers::properties::unpublish),
        )
        .route("/leads", get(handlers::leads::list_leads))
        .route("/leads/:id/status", put(handlers::leads::update_lead_status))
        .route("/clients", get(handlers::clients::list))
        .route("/clients/:id", get(handlers::clients::get))
        .route("/invoice-requests", get(handlers::invoices::list))
        .route(
            "/invoice-requests/:id/status",
            put(handlers::invoices::update_status),
        )
        .route("/activity", get(handlers::activity::recent));

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(public)
        .nest("/portal", portal)
        .nest("/admin", admin)
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "habitara-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn pagination_math() {
        let page: PaginatedResponse<u32> = PaginatedResponse::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResponse<u32> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn error_response_carries_the_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
