//! Back-office invoice-request management.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::InvoiceStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, PaginationParams};
use crate::validation::validate_invoice_status;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub status: Option<String>,
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

pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Response, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<InvoiceStatus>()
                .map_err(|_| ServiceError::BadRequest(format!("unknown invoice status: {}", raw)))
        })
        .transpose()?;

    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (requests, total) = state
        .services
        .invoices
        .list(status, pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(pagination.paginate(requests, total)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceStatusRequest {
    pub status: String,
}

/// Transition an invoice request. Terminal transitions stamp the processing
/// metadata; the affected client is told about any real change, best-effort.
#[utoipa::path(
    put,
    path = "/api/v1/admin/invoice-requests/{id}/status",
    tag = "Invoices",
    params(("id" = Uuid, Path, description = "Invoice request id")),
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Updated invoice request"),
        (status = 404, description = "No such invoice request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request is already in a terminal status", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown status value", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_status(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatusRequest>,
) -> Result<Response, ServiceError> {
    let next = validate_invoice_status(&payload.status)?;
    let admin_id = Uuid::parse_str(&admin.0.user_id)
        .map_err(|_| ServiceError::BadRequest("invalid admin id".to_string()))?;

    let before = state.services.invoices.get(id).await?;
    let updated = state
        .services
        .invoices
        .update_status(id, next, admin_id)
        .await?;

    // No-op transitions change nothing and notify no one.
    if updated.status != before.status {
        if let Some(client) = state.services.clients.get(updated.client_id).await? {
            state
                .services
                .notifications
                .invoice_status_changed(&updated, &client)
                .await;
        }
    }

    Ok(success_response(updated))
}
