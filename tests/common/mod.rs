#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware, Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use habitara_api::{
    auth::{AuthConfig, AuthService, Claims},
    config::AppConfig,
    db,
    entities::client,
    handlers::AppServices,
    notifications::RecordingMailer,
    rate_limiter::{RateLimitBackend, RateLimiter},
    schema,
    storage::InMemoryStorage,
    AppState,
};

const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
const STAFF_INBOX: &str = "agencia@habitara.es";

/// Test harness: the real router over a fresh SQLite database, with a
/// recording mailer in place of the mail provider.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    admin_id: Uuid,
    admin_token: String,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("habitara_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "redis://127.0.0.1:6379".to_string(),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        schema::ensure_schema(&pool)
            .await
            .expect("failed to bootstrap test schema");
        let db_arc = Arc::new(pool);

        let auth_service = Arc::new(AuthService::new(AuthConfig {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.jwt_issuer.clone(),
            jwt_audience: cfg.jwt_audience.clone(),
        }));

        let rate_limiter = RateLimiter::new(cfg.rate_limit_config(), RateLimitBackend::InMemory);

        let mailer = Arc::new(RecordingMailer::new());
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(InMemoryStorage::new()),
            mailer.clone(),
            STAFF_INBOX.to_string(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            auth: auth_service.clone(),
            rate_limiter,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", habitara_api::api_v1_routes())
            .nest(
                "/auth",
                habitara_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(middleware::from_fn_with_state(
                auth_service,
                habitara_api::auth::auth_middleware,
            ))
            .layer(middleware::from_fn(
                habitara_api::request_id::scope_request_id,
            ))
            .layer(habitara_api::request_id::propagate_request_id_layer())
            .layer(habitara_api::request_id::set_request_id_layer())
            .with_state(state.clone());

        let admin_id = Uuid::new_v4();
        let admin_token = mint_token(&cfg, &admin_id.to_string(), vec!["admin".to_string()]);

        Self {
            router,
            state,
            mailer,
            admin_id,
            admin_token,
            _db_dir: db_dir,
        }
    }

    pub fn admin_id(&self) -> Uuid {
        self.admin_id
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Mint a portal token for an identity-provider subject.
    pub fn client_token(&self, identity_id: &str) -> String {
        mint_token(&self.state.config, identity_id, vec!["client".to_string()])
    }

    /// Provision a client profile the way back-office tooling would.
    pub async fn seed_client(&self, identity_id: &str, name: &str, email: &str) -> client::Model {
        self.state
            .services
            .clients
            .create(identity_id, name, email, None)
            .await
            .expect("seed client profile")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, token, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

fn mint_token(cfg: &AppConfig, sub: &str, roles: Vec<String>) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        name: Some("Test User".to_string()),
        email: Some("test@example.com".to_string()),
        roles,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
        iss: cfg.jwt_issuer.clone(),
        aud: cfg.jwt_audience.clone(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .expect("encode test token")
}

/// Read a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}

/// A property payload that passes validation, for tests to tweak.
pub fn property_payload(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "Reformado, muy luminoso.",
        "price": 325000,
        "bedrooms": 3,
        "bathrooms": 2,
        "square_meters": 110,
        "year_built": 1975,
        "floor": 4,
        "property_type": "apartment",
        "address": "Calle de Alcalá 200",
        "city": "Madrid"
    })
}
