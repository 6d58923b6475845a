use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Habitara API",
        version = "0.3.0",
        description = r#"
# Habitara Real-Estate Platform API

Backend for the Habitara agency: public property listings, an owner portal
for submitting listings and invoice requests, and the back office agents use
to manage properties, clients, leads and invoice requests.

## Authentication

Portal and admin endpoints expect a bearer token issued by the identity
provider:

```
Authorization: Bearer <token>
```

## Rate limiting

Public submission endpoints are rate-limited per operation and client
address. A rejected request returns `429` with a `Retry-After` header and a
`retry_after_ms` field in the body.

## Validation

Submission payloads are validated as a whole: a rejected payload returns
`422` with a `field_errors` map listing every failing field, not just the
first one.
        "#,
        contact(
            name = "Habitara",
            email = "dev@habitara.es"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.habitara.es", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Properties", description = "Public listing endpoints"),
        (name = "Leads", description = "Valuation and contact submissions"),
        (name = "Invoices", description = "Invoice request management"),
    ),
    paths(
        crate::handlers::properties::list_published,
        crate::handlers::properties::get_published,
        crate::handlers::leads::submit_valuation,
        crate::handlers::leads::submit_contact,
        crate::handlers::invoices::update_status,
        // Portal, admin and health paths intentionally omitted for now
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::errors::ErrorResponse,
            crate::validation::FieldErrors,
            crate::validation::ValuationRequestPayload,
            crate::validation::ContactRequestPayload,
            crate::validation::InvoiceRequestPayload,
            crate::validation::PropertyPayload,
            crate::validation::ImageMetadataPayload,
            crate::domain::PropertyType,
            crate::domain::PropertyStatus,
            crate::domain::LeadStatus,
            crate::domain::InvoiceType,
            crate::domain::InvoiceStatus,
            crate::handlers::leads::UpdateLeadStatusRequest,
            crate::handlers::invoices::UpdateInvoiceStatusRequest,
            crate::auth::AuthUser,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Habitara API"));
        assert!(json.contains("/api/v1/properties"));
        assert!(json.contains("/api/v1/valuations"));
    }
}
