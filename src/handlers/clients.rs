//! Back-office client directory.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, PaginationParams};
use crate::AppState;

pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (clients, total) = state
        .services
        .clients
        .list(pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(pagination.paginate(clients, total)))
}

pub async fn get(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let client = state
        .services
        .clients
        .get(id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    Ok(success_response(client))
}
