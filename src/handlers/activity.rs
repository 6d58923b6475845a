//! Back-office activity feed.

use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::auth::AdminUser;
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, PaginationParams};
use crate::AppState;

pub async fn recent(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let entries = state
        .services
        .activity
        .list_recent(pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(entries))
}
