mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn valuation_submission_is_persisted_and_notified() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/valuations",
            Some(json!({
                "name": "  María García  ",
                "email": "Maria.Garcia@Example.COM",
                "phone": "612 345 678",
                "address": "Calle de Serrano 21, Madrid",
                "property_type": "apartment",
                "message": "Ático en Salamanca, 3 habs"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "María García");
    assert_eq!(body["data"]["email"], "maria.garcia@example.com");
    assert_eq!(body["data"]["phone"], "612345678");
    assert_eq!(body["data"]["status"], "new");

    // Staff got the notification.
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "agencia@habitara.es");
    assert!(sent[0].subject.contains("valoración"));
    assert!(sent[0].text.contains("612345678"));

    // The lead is visible in the back office.
    let response = app
        .request(
            Method::GET,
            "/api/v1/admin/leads?kind=valuation",
            None,
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn invalid_phone_is_rejected_with_a_field_error() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/valuations",
            Some(json!({
                "name": "María García",
                "email": "maria@example.com",
                "phone": "12345",
                "address": "Calle de Serrano 21, Madrid"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("error responses carry a request id");

    let body = read_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["request_id"], request_id.as_str());
    assert!(body["field_errors"]["phone"]
        .as_str()
        .unwrap()
        .contains("Spanish phone"));

    // Nothing was persisted or emailed.
    assert!(app.mailer.sent().is_empty());
    let response = app
        .request(Method::GET, "/api/v1/admin/leads", None, Some(app.admin_token()))
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn every_violation_is_reported_in_one_pass() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/contacts",
            Some(json!({
                "name": "A",
                "email": "not-an-email",
                "phone": "12345"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = read_json(response).await;
    let errors = body["field_errors"].as_object().unwrap();
    assert_eq!(errors.len(), 4);
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("phone"));
    assert!(errors.contains_key("message"));
}

#[tokio::test]
async fn markup_is_stripped_before_persistence_and_mail() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/contacts",
            Some(json!({
                "name": "Juan Pérez",
                "email": "juan@example.com",
                "message": "<script>alert(1)</script>Me interesa el ático"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    let message = body["data"]["message"].as_str().unwrap();
    assert_eq!(message, "Me interesa el ático");
    assert!(!message.contains('<'));

    let sent = app.mailer.sent();
    assert!(!sent[0].html.contains("<script"));
    assert!(!sent[0].text.contains("alert(1)"));
}

#[tokio::test]
async fn mail_provider_failure_does_not_fail_the_request() {
    let app = TestApp::new().await;
    app.mailer.fail_next_sends(true);

    let response = app
        .request(
            Method::POST,
            "/api/v1/contacts",
            Some(json!({
                "name": "Juan Pérez",
                "email": "juan@example.com",
                "message": "Me interesa el piso"
            })),
            None,
        )
        .await;

    // Dispatch failed, yet the submission was recorded and acknowledged.
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(app.mailer.sent().is_empty());

    let response = app
        .request(Method::GET, "/api/v1/admin/leads", None, Some(app.admin_token()))
        .await;
    let body = read_json(response).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn eleventh_contact_within_the_window_is_rate_limited() {
    let app = TestApp::new().await;
    let from_ip = [("x-forwarded-for", "203.0.113.77")];

    for i in 0..10 {
        let response = app
            .request_with_headers(
                Method::POST,
                "/api/v1/contacts",
                Some(json!({
                    "name": "Juan Pérez",
                    "email": "juan@example.com",
                    "message": format!("Mensaje número {}", i)
                })),
                None,
                &from_ip,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "request {} should pass", i);
    }

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/contacts",
            Some(json!({
                "name": "Juan Pérez",
                "email": "juan@example.com",
                "message": "Mensaje número 11"
            })),
            None,
            &from_ip,
        )
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    let body = read_json(response).await;
    assert_eq!(body["code"], "RATE_LIMITED");
    let retry_after_ms = body["retry_after_ms"].as_u64().unwrap();
    assert!(retry_after_ms > 0 && retry_after_ms <= 60_000);

    // Another client is unaffected.
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/contacts",
            Some(json!({
                "name": "Lucía Gómez",
                "email": "lucia@example.com",
                "message": "Quisiera más información"
            })),
            None,
            &[("x-forwarded-for", "198.51.100.9")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn operations_have_independent_rate_buckets() {
    let app = TestApp::new().await;
    let from_ip = [("x-forwarded-for", "203.0.113.90")];

    for _ in 0..10 {
        let response = app
            .request_with_headers(
                Method::POST,
                "/api/v1/contacts",
                Some(json!({
                    "name": "Juan Pérez",
                    "email": "juan@example.com",
                    "message": "Hola"
                })),
                None,
                &from_ip,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Contact bucket exhausted; valuations from the same address still pass.
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/valuations",
            Some(json!({
                "name": "Juan Pérez",
                "email": "juan@example.com",
                "phone": "612345678",
                "address": "Calle Mayor 1, Madrid"
            })),
            None,
            &from_ip,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
