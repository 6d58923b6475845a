mod common;

use axum::http::{Method, StatusCode};
use common::{property_payload, read_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_listing(app: &TestApp, payload: Value, publish: bool) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/properties",
            Some(payload),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    if publish {
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/admin/properties/{}/publish", id),
                None,
                Some(app.admin_token()),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    id
}

#[tokio::test]
async fn only_published_listings_are_visible() {
    let app = TestApp::new().await;

    let published = create_listing(&app, property_payload("Ático con terraza"), true).await;
    create_listing(&app, property_payload("Piso sin publicar"), false).await;

    let response = app.request(Method::GET, "/api/v1/properties", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], published.as_str());

    // The back office sees both.
    let response = app
        .request(Method::GET, "/api/v1/admin/properties", None, Some(app.admin_token()))
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn unpublished_detail_is_a_not_found() {
    let app = TestApp::new().await;
    let hidden = create_listing(&app, property_payload("Piso sin publicar"), false).await;

    let response = app
        .request(Method::GET, &format!("/api/v1/properties/{}", hidden), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/properties/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn filters_narrow_the_listing_search() {
    let app = TestApp::new().await;

    let mut centro = property_payload("Ático en el centro");
    centro["city"] = json!("Madrid");
    centro["price"] = json!(495000);
    centro["bedrooms"] = json!(3);
    create_listing(&app, centro, true).await;

    let mut playa = property_payload("Apartamento junto a la playa");
    playa["city"] = json!("Valencia");
    playa["price"] = json!(180000);
    playa["bedrooms"] = json!(1);
    create_listing(&app, playa, true).await;

    let response = app
        .request(Method::GET, "/api/v1/properties?city=Madrid", None, None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["city"], "Madrid");

    let response = app
        .request(Method::GET, "/api/v1/properties?max_price=200000", None, None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["city"], "Valencia");

    let response = app
        .request(Method::GET, "/api/v1/properties?min_bedrooms=2", None, None)
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    // Unknown enum values are rejected, not ignored.
    let response = app
        .request(Method::GET, "/api/v1/properties?property_type=castle", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detail_view_includes_listing_images() {
    let app = TestApp::new().await;
    app.seed_client("idp|ana", "Ana Ruiz", "ana@example.com").await;
    let token = app.client_token("idp|ana");

    let response = app
        .request(
            Method::POST,
            "/api/v1/portal/properties",
            Some(property_payload("Ático con terraza")),
            Some(&token),
        )
        .await;
    let body = read_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    app.request(
        Method::POST,
        &format!("/api/v1/portal/properties/{}/images", id),
        Some(json!({
            "file_name": "salon.jpg",
            "content_type": "image/jpeg",
            "size_bytes": 1024
        })),
        Some(&token),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/properties/{}/publish", id),
            None,
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, &format!("/api/v1/properties/{}", id), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["property"]["id"], id.as_str());
    assert_eq!(body["data"]["images"][0]["file_name"], "salon.jpg");
}

#[tokio::test]
async fn invalid_admin_payload_reports_every_numeric_violation() {
    let app = TestApp::new().await;

    let mut payload = property_payload("Piso con datos imposibles");
    payload["price"] = json!(-5);
    payload["bedrooms"] = json!(42);
    payload["square_meters"] = json!(0);

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/properties",
            Some(payload),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = read_json(response).await;
    let errors = body["field_errors"].as_object().unwrap();
    assert!(errors.contains_key("price"));
    assert!(errors.contains_key("bedrooms"));
    assert!(errors.contains_key("square_meters"));
}
