//! Public submission endpoints (valuation and contact requests) and the
//! back-office lead views behind them.
//!
//! The submission handlers run the fixed pipeline: rate-limit check,
//! validate/sanitize, persist, best-effort notify, respond. The notification
//! outcome never influences the response.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::{LeadKind, LeadStatus};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, enforce_rate_limit, success_response, PaginationParams,
};
use crate::rate_limiter::ClientIp;
use crate::validation::{
    validate_contact_request, validate_lead_status, validate_valuation_request,
    ContactRequestPayload, ValuationRequestPayload,
};
use crate::AppState;

/// Submit a valuation request.
#[utoipa::path(
    post,
    path = "/api/v1/valuations",
    tag = "Leads",
    request_body = ValuationRequestPayload,
    responses(
        (status = 201, description = "Valuation request recorded"),
        (status = 422, description = "One or more fields failed validation", body = crate::errors::ErrorResponse),
        (status = 429, description = "Too many requests from this client", body = crate::errors::ErrorResponse),
    )
)]
pub async fn submit_valuation(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(payload): Json<ValuationRequestPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "valuation", &client_ip).await?;

    let submission = validate_valuation_request(&payload)?;
    let lead = state.services.leads.create_valuation(&submission).await?;

    // Committed above; delivery failure is logged inside the dispatcher.
    state
        .services
        .notifications
        .valuation_received(&submission, lead.id)
        .await;

    Ok(created_response(lead))
}

/// Submit a contact-form message, optionally about a listing.
#[utoipa::path(
    post,
    path = "/api/v1/contacts",
    tag = "Leads",
    request_body = ContactRequestPayload,
    responses(
        (status = 201, description = "Contact request recorded"),
        (status = 422, description = "One or more fields failed validation", body = crate::errors::ErrorResponse),
        (status = 429, description = "Too many requests from this client", body = crate::errors::ErrorResponse),
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(payload): Json<ContactRequestPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "contact", &client_ip).await?;

    let submission = validate_contact_request(&payload)?;
    let lead = state.services.leads.create_contact(&submission).await?;

    state
        .services
        .notifications
        .contact_received(&submission, lead.id)
        .await;

    Ok(created_response(lead))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    pub kind: Option<String>,
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

/// Back-office list of leads, filterable by kind and status.
pub async fn list_leads(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> Result<Response, ServiceError> {
    let kind = query
        .kind
        .as_deref()
        .map(|raw| {
            raw.parse::<LeadKind>()
                .map_err(|_| ServiceError::BadRequest(format!("unknown lead kind: {}", raw)))
        })
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<LeadStatus>()
                .map_err(|_| ServiceError::BadRequest(format!("unknown lead status: {}", raw)))
        })
        .transpose()?;

    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let (leads, total) = state
        .services
        .leads
        .list(kind, status, pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(pagination.paginate(leads, total)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLeadStatusRequest {
    pub status: String,
}

/// Move a lead through the pipeline (new → contacted → closed).
pub async fn update_lead_status(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusRequest>,
) -> Result<Response, ServiceError> {
    let status = validate_lead_status(&payload.status)?;
    let lead = state
        .services
        .leads
        .update_status(id, status, &admin.0.user_id)
        .await?;

    Ok(success_response(lead))
}
