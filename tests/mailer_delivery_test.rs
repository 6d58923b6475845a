use std::time::Duration;

use habitara_api::notifications::{EmailMessage, HttpMailer, Mailer, MailerError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message() -> EmailMessage {
    EmailMessage {
        to: "agencia@habitara.es".to_string(),
        subject: "Nueva solicitud de valoración".to_string(),
        html: "<h2>Solicitud</h2>".to_string(),
        text: "Solicitud".to_string(),
    }
}

#[tokio::test]
async fn posts_the_rendered_message_to_the_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("authorization", "Bearer mail-token"))
        .and(body_partial_json(json!({
            "from": "Habitara <no-reply@habitara.es>",
            "to": ["agencia@habitara.es"],
            "subject": "Nueva solicitud de valoración",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mailer = HttpMailer::new(
        format!("{}/messages", server.uri()),
        Some("mail-token".to_string()),
        "Habitara <no-reply@habitara.es>".to_string(),
        Duration::from_secs(5),
    );

    mailer.send(&message()).await.unwrap();
}

#[tokio::test]
async fn provider_rejections_surface_as_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mailer = HttpMailer::new(
        format!("{}/messages", server.uri()),
        None,
        "Habitara <no-reply@habitara.es>".to_string(),
        Duration::from_secs(5),
    );

    match mailer.send(&message()).await {
        Err(MailerError::Provider { status }) => assert_eq!(status, 503),
        other => panic!("expected provider error, got {:?}", other.map(|_| ())),
    }
}
