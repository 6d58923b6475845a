use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use habitara_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::schema::ensure_schema(&db_pool).await.map_err(|e| {
            error!("schema bootstrap failed: {}", e);
            anyhow::anyhow!(e)
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Auth service validating identity-provider tokens
    let auth_service = Arc::new(api::auth::AuthService::new(api::auth::AuthConfig {
        jwt_secret: cfg.jwt_secret.clone(),
        jwt_issuer: cfg.jwt_issuer.clone(),
        jwt_audience: cfg.jwt_audience.clone(),
    }));

    // Rate limiter: in-memory by default, Redis-backed for multi-instance
    let rl_backend = if cfg.rate_limit_use_redis {
        let client = redis::Client::open(cfg.redis_url.clone())
            .context("invalid redis url for rate limiting")?;
        info!("rate limiter using Redis backend");
        api::rate_limiter::RateLimitBackend::Redis {
            client: Arc::new(client),
            namespace: cfg.rate_limit_namespace.clone(),
        }
    } else {
        api::rate_limiter::RateLimitBackend::InMemory
    };
    let rate_limiter = api::rate_limiter::RateLimiter::new(cfg.rate_limit_config(), rl_backend);

    // Mail boundary: disabled unless a provider endpoint is configured
    let mailer: Arc<dyn api::notifications::Mailer> = match &cfg.mail_api_url {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "transactional mail enabled");
            Arc::new(api::notifications::HttpMailer::new(
                endpoint.clone(),
                cfg.mail_api_token.clone(),
                cfg.notify_from.clone(),
                Duration::from_secs(cfg.mail_timeout_secs),
            ))
        }
        None => {
            info!("no mail provider configured; notifications will be dropped");
            Arc::new(api::notifications::NullMailer)
        }
    };

    let storage: Arc<dyn api::storage::ObjectStorage> =
        Arc::new(api::storage::InMemoryStorage::new());

    let services = api::handlers::AppServices::new(
        db_arc.clone(),
        storage,
        mailer,
        cfg.notify_staff_to.clone(),
    );

    let app_state = api::AppState {
        db: db_arc,
        config: cfg.clone(),
        auth: auth_service.clone(),
        rate_limiter,
        services,
    };

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "using permissive CORS ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        error!("missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        anyhow::bail!("missing CORS configuration");
    };

    let app = Router::new()
        .route("/", get(|| async { "habitara-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .nest(
            "/auth",
            api::auth::auth_routes().with_state(auth_service.clone()),
        )
        .merge(api::openapi::swagger_ui())
        // Resolve bearer tokens once per request for the whole surface
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            api::auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer)
        // Assign each request an id, expose it to response rendering and
        // mirror it onto the response
        .layer(axum::middleware::from_fn(api::request_id::scope_request_id))
        .layer(api::request_id::propagate_request_id_layer())
        .layer(api::request_id::set_request_id_layer())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("habitara-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
