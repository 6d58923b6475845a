//! Client portal: property owners manage their own listings, images and
//! invoice requests.
//!
//! Every route requires a signed-in identity with a provisioned client
//! profile. Resources belonging to another client are reported as missing,
//! never as forbidden, so the portal leaks no existence information.

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::domain::PropertyStatus;
use crate::entities::client;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, enforce_rate_limit, no_content_response, success_response,
};
use crate::rate_limiter::ClientIp;
use crate::validation::{
    validate_image_metadata, validate_invoice_request, validate_property_payload,
    ImageMetadataPayload, InvoiceRequestPayload, PropertyPayload,
};
use crate::AppState;

async fn current_client(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<client::Model, ServiceError> {
    state
        .services
        .clients
        .require_by_identity(&user.0.user_id)
        .await
}

/// The signed-in client's profile.
pub async fn profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let client = current_client(&state, &user).await?;
    Ok(success_response(client))
}

/// The client's own listings, published or not.
pub async fn list_properties(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let client = current_client(&state, &user).await?;
    let properties = state.services.properties.list_for_owner(client.id).await?;
    Ok(success_response(properties))
}

/// Submit a listing for review. Portal submissions always land unpublished
/// with pending-review status; an agent publishes them from the back office.
pub async fn submit_property(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(payload): Json<PropertyPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "property", &client_ip).await?;

    let draft = validate_property_payload(&payload)?;
    let client = current_client(&state, &user).await?;

    let property = state
        .services
        .properties
        .create(
            Some(client.id),
            &draft,
            PropertyStatus::PendingReview,
            false,
            &user.0.user_id,
        )
        .await?;

    state
        .services
        .notifications
        .property_submitted(&property, &client)
        .await;

    Ok(created_response(property))
}

/// Edit one of the client's own listings. Owners cannot change status or
/// publication; those stay with the back office.
pub async fn update_property(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
    Json(payload): Json<PropertyPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "property", &client_ip).await?;

    let draft = validate_property_payload(&payload)?;
    let client = current_client(&state, &user).await?;

    let property = state
        .services
        .properties
        .update_for_owner(client.id, id, &draft, &user.0.user_id)
        .await?;

    Ok(success_response(property))
}

/// Attach an image to one of the client's listings. The blob itself goes
/// through the storage boundary; only validated metadata reaches the record.
pub async fn add_image(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Path(id): Path<Uuid>,
    Json(payload): Json<ImageMetadataPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "property", &client_ip).await?;

    let metadata = validate_image_metadata(&payload)?;
    let client = current_client(&state, &user).await?;

    let image = state
        .services
        .properties
        .add_image_for_owner(client.id, id, &metadata, &user.0.user_id)
        .await?;

    Ok(created_response(image))
}

pub async fn remove_image(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ServiceError> {
    let client = current_client(&state, &user).await?;

    state
        .services
        .properties
        .remove_image_for_owner(client.id, id, image_id, &user.0.user_id)
        .await?;

    Ok(no_content_response())
}

/// The client's own invoice requests.
pub async fn list_invoice_requests(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let client = current_client(&state, &user).await?;
    let requests = state.services.invoices.list_for_client(client.id).await?;
    Ok(success_response(requests))
}

/// Request an invoice from the agency.
pub async fn create_invoice_request(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(payload): Json<InvoiceRequestPayload>,
) -> Result<Response, ServiceError> {
    enforce_rate_limit(&state.rate_limiter, "invoice", &client_ip).await?;

    let submission = validate_invoice_request(&payload)?;
    let client = current_client(&state, &user).await?;

    let request = state
        .services
        .invoices
        .create(client.id, &submission, &user.0.user_id)
        .await?;

    state
        .services
        .notifications
        .invoice_request_submitted(&request, &client)
        .await;

    Ok(created_response(request))
}
