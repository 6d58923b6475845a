//! Public listing reads and back-office property management.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::{PropertyStatus, PropertyType};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, PaginationParams,
};
use crate::services::properties::PropertyFilters;
use crate::validation::{validate_property_payload, PropertyPayload};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PropertyListQuery {
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_bedrooms: Option<i16>,
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

impl PropertyListQuery {
    fn filters(&self) -> Result<PropertyFilters, ServiceError> {
        let property_type = self
            .property_type
            .as_deref()
            .map(|raw| {
                raw.parse::<PropertyType>().map_err(|_| {
                    ServiceError::BadRequest(format!("unknown property type: {}", raw))
                })
            })
            .transpose()?;

        Ok(PropertyFilters {
            city: self.city.clone(),
            property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
        })
    }

    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Browse published listings.
#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "Properties",
    responses(
        (status = 200, description = "Published listings matching the filters"),
        (status = 400, description = "Unknown filter value", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<PropertyListQuery>,
) -> Result<Response, ServiceError> {
    let filters = query.filters()?;
    let pagination = query.pagination();

    let (properties, total) = state
        .services
        .properties
        .list_published(&filters, pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(pagination.paginate(properties, total)))
}

/// Published listing detail. Unpublished listings do not exist here.
#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail"),
        (status = 404, description = "No published listing with this id", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_published(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let property = state.services.properties.get_published(id).await?;
    let images = state.services.properties.images(id).await?;

    Ok(success_response(serde_json::json!({
        "property": property,
        "images": images,
    })))
}

/// Back-office list of every listing, published or not.
pub async fn list_all(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (properties, total) = state
        .services
        .properties
        .list_all(pagination.limit(), pagination.offset())
        .await?;

    Ok(success_response(pagination.paginate(properties, total)))
}

/// Create an agency-owned listing.
pub async fn create(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<PropertyPayload>,
) -> Result<Response, ServiceError> {
    let draft = validate_property_payload(&payload)?;
    let status = draft.status.unwrap_or(PropertyStatus::Active);

    let property = state
        .services
        .properties
        .create(None, &draft, status, false, &admin.0.user_id)
        .await?;

    Ok(created_response(property))
}

pub async fn update(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PropertyPayload>,
) -> Result<Response, ServiceError> {
    let draft = validate_property_payload(&payload)?;
    let property = state
        .services
        .properties
        .update(id, &draft, &admin.0.user_id)
        .await?;

    Ok(success_response(property))
}

pub async fn delete(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .services
        .properties
        .delete(id, &admin.0.user_id)
        .await?;

    Ok(no_content_response())
}

/// Make a listing visible on the public site.
pub async fn publish(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let property = state
        .services
        .properties
        .publish(id, &admin.0.user_id)
        .await?;

    Ok(success_response(property))
}

pub async fn unpublish(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let property = state
        .services
        .properties
        .unpublish(id, &admin.0.user_id)
        .await?;

    Ok(success_response(property))
}
