//! Identity boundary.
//!
//! Tokens are issued by the external identity provider; this service only
//! verifies them (`verify_credential`), resolves the caller
//! (`current_identity`) and revokes presented tokens (`sign_out`). There is
//! exactly one identity abstraction in the codebase — handlers never talk
//! to a provider SDK directly.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Claims expected on identity-provider tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Caller identity resolved from a verified token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token revoked")]
    RevokedToken,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            Self::MissingCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::RevokedToken => (StatusCode::UNAUTHORIZED, "TOKEN_REVOKED"),
            Self::InsufficientPermissions => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        let body = Json(serde_json::json!({
            "code": code,
            "message": self.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

#[derive(Clone, Debug)]
struct RevokedToken {
    jti: String,
    expires_at: DateTime<Utc>,
}

/// Token verification and revocation against the external provider's secret.
#[derive(Debug)]
pub struct AuthService {
    config: AuthConfig,
    revoked: RwLock<Vec<RevokedToken>>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            revoked: RwLock::new(Vec::new()),
        }
    }

    /// Verify a bearer token and return its claims.
    pub async fn verify_credential(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Resolve the caller behind a bearer token.
    pub async fn current_identity(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.verify_credential(token).await?;
        Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            token_id: claims.jti,
        })
    }

    /// Revoke the presented token for the rest of its lifetime.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.verify_credential(token).await?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        let mut revoked = self.revoked.write().await;
        let now = Utc::now();
        revoked.retain(|t| t.expires_at > now);
        revoked.push(RevokedToken {
            jti: claims.jti,
            expires_at,
        });
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.iter().any(|t| t.jti == jti)
    }
}

fn bearer_token(parts: &http::HeaderMap) -> Option<&str> {
    parts
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Resolve the caller once per request and stash the identity in request
/// extensions. Requests without credentials pass through untouched (public
/// endpoints); a presented-but-invalid token is rejected here.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match auth.current_identity(token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(err) => return err.into_response(),
        }
    }

    next.run(request).await
}

/// Extractor for endpoints that require a signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Extractor for back-office endpoints; requires the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(AdminUser(user))
    }
}

async fn me(user: AuthenticatedUser) -> Json<AuthUser> {
    Json(user.0)
}

async fn logout(
    State(auth): State<Arc<AuthService>>,
    request: Request,
) -> Result<StatusCode, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingCredentials)?;
    auth.sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn auth_routes() -> Router<Arc<AuthService>> {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "a_sufficiently_long_test_secret_value_1234";

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_issuer: "habitara-auth".to_string(),
            jwt_audience: "habitara-api".to_string(),
        })
    }

    fn token(jti: &str, roles: Vec<String>, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            name: Some("Lucía".to_string()),
            email: Some("lucia@example.com".to_string()),
            roles,
            jti: jti.to_string(),
            iat: now,
            exp: now + ttl_secs,
            iss: "habitara-auth".to_string(),
            aud: "habitara-api".to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn verifies_valid_tokens() {
        let auth = service();
        let claims = auth
            .verify_credential(&token("t1", vec!["client".into()], 600))
            .await
            .unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[tokio::test]
    async fn rejects_expired_and_garbage_tokens() {
        let auth = service();

        let expired = token("t2", vec![], -60);
        assert!(matches!(
            auth.verify_credential(&expired).await,
            Err(AuthError::TokenExpired)
        ));

        assert!(matches!(
            auth.verify_credential("not.a.token").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let auth = AuthService::new(AuthConfig {
            jwt_secret: SECRET.to_string(),
            jwt_issuer: "habitara-auth".to_string(),
            jwt_audience: "another-api".to_string(),
        });
        assert!(matches!(
            auth.verify_credential(&token("t3", vec![], 600)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_token() {
        let auth = service();
        let t = token("t4", vec!["client".into()], 600);

        auth.verify_credential(&t).await.unwrap();
        auth.sign_out(&t).await.unwrap();

        assert!(matches!(
            auth.verify_credential(&t).await,
            Err(AuthError::RevokedToken)
        ));
    }

    #[tokio::test]
    async fn admin_role_is_required_for_admin_identity() {
        let auth = service();
        let identity = auth
            .current_identity(&token("t5", vec!["client".into()], 600))
            .await
            .unwrap();
        assert!(!identity.is_admin());

        let identity = auth
            .current_identity(&token("t6", vec!["admin".into()], 600))
            .await
            .unwrap();
        assert!(identity.is_admin());
    }
}
