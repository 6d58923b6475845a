//! Best-effort transactional email.
//!
//! The dispatcher renders a subject plus HTML and plain-text bodies from a
//! domain event and hands them to the mail boundary. Delivery is strictly
//! best-effort: every failure is logged and folded into `false`, and call
//! sites persist their records *before* dispatching, so a dropped email
//! never hides an event — it stays queryable in the back office.
//!
//! There is no in-process retry; a dropped notification survives only as
//! the stored record and the log line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::entities::{client, invoice_request, property};
use crate::validation::{ContactSubmission, ValuationSubmission};

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail provider rejected the message with status {status}")]
    Provider { status: u16 },
}

/// The email boundary. Implementations receive fully rendered messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Mailer backed by a transactional-mail HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, token: Option<String>, from: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint,
            token,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let payload = serde_json::json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailerError::Provider {
                status: response.status().as_u16(),
            });
        }

        info!(to = %message.to, subject = %message.subject, "notification email delivered");
        Ok(())
    }
}

/// Mailer used when no provider is configured. Drops messages silently
/// apart from a debug line.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        debug!(to = %message.to, subject = %message.subject, "mail disabled, dropping notification");
        Ok(())
    }
}

/// Test double that records outgoing messages and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailerError::Provider { status: 503 });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Renders and dispatches notification emails for domain events.
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    staff_to: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, staff_to: String) -> Self {
        Self { mailer, staff_to }
    }

    /// New valuation request → staff inbox.
    pub async fn valuation_received(
        &self,
        submission: &ValuationSubmission,
        lead_id: uuid::Uuid,
    ) -> bool {
        let subject = format!("Nueva solicitud de valoración — {}", submission.address);
        let mut lines = vec![
            ("Nombre", submission.name.clone()),
            ("Email", submission.email.clone()),
            ("Teléfono", submission.phone.clone()),
            ("Dirección", submission.address.clone()),
        ];
        if let Some(property_type) = submission.property_type {
            lines.push(("Tipo", property_type.to_string()));
        }
        if let Some(message) = &submission.message {
            lines.push(("Mensaje", message.clone()));
        }
        lines.push(("Referencia", lead_id.to_string()));

        self.dispatch(self.staff_message(subject, "Solicitud de valoración", &lines))
            .await
    }

    /// New contact-form message → staff inbox.
    pub async fn contact_received(
        &self,
        submission: &ContactSubmission,
        lead_id: uuid::Uuid,
    ) -> bool {
        let subject = match &submission.subject {
            Some(s) => format!("Nuevo mensaje de contacto — {}", s),
            None => "Nuevo mensaje de contacto".to_string(),
        };
        let mut lines = vec![
            ("Nombre", submission.name.clone()),
            ("Email", submission.email.clone()),
        ];
        if let Some(phone) = &submission.phone {
            lines.push(("Teléfono", phone.clone()));
        }
        if let Some(property_id) = submission.property_id {
            lines.push(("Inmueble", property_id.to_string()));
        }
        lines.push(("Mensaje", submission.message.clone()));
        lines.push(("Referencia", lead_id.to_string()));

        self.dispatch(self.staff_message(subject, "Mensaje de contacto", &lines))
            .await
    }

    /// Portal listing submission → staff inbox.
    pub async fn property_submitted(
        &self,
        property: &property::Model,
        owner: &client::Model,
    ) -> bool {
        let subject = format!("Nuevo inmueble pendiente de revisión — {}", property.title);
        let lines = vec![
            ("Título", property.title.clone()),
            ("Dirección", property.address.clone()),
            ("Ciudad", property.city.clone()),
            ("Precio", format!("{} €", property.price)),
            ("Propietario", format!("{} <{}>", owner.name, owner.email)),
            ("Referencia", property.id.to_string()),
        ];

        self.dispatch(self.staff_message(subject, "Inmueble enviado desde el portal", &lines))
            .await
    }

    /// New invoice request → staff inbox.
    pub async fn invoice_request_submitted(
        &self,
        request: &invoice_request::Model,
        client: &client::Model,
    ) -> bool {
        let subject = format!("Nueva solicitud de factura de {}", client.name);
        let mut lines = vec![
            ("Cliente", format!("{} <{}>", client.name, client.email)),
            ("Tipo", request.invoice_type.clone()),
        ];
        if let Some(amount) = request.amount {
            lines.push(("Importe", format!("{} €", amount)));
        }
        if let Some(notes) = &request.notes {
            lines.push(("Notas", notes.clone()));
        }
        lines.push(("Referencia", request.id.to_string()));

        self.dispatch(self.staff_message(subject, "Solicitud de factura", &lines))
            .await
    }

    /// Invoice status transition → the affected client. The caller resolves
    /// the recipient; this service never looks anyone up.
    pub async fn invoice_status_changed(
        &self,
        request: &invoice_request::Model,
        client: &client::Model,
    ) -> bool {
        let subject = format!(
            "Su solicitud de factura está ahora: {}",
            request.status
        );
        let mut lines = vec![
            ("Solicitud", request.id.to_string()),
            ("Estado", request.status.clone()),
        ];
        if let Some(processed_at) = request.processed_at {
            lines.push(("Procesada", processed_at.to_rfc3339()));
        }

        let message = render(
            client.email.clone(),
            subject,
            &format!("Hola {},", client.name),
            "Estado de su solicitud de factura",
            &lines,
        );
        self.dispatch(message).await
    }

    fn staff_message(
        &self,
        subject: String,
        heading: &str,
        lines: &[(&str, String)],
    ) -> EmailMessage {
        render(self.staff_to.clone(), subject, "Hola,", heading, lines)
    }

    async fn dispatch(&self, message: EmailMessage) -> bool {
        match self.mailer.send(&message).await {
            Ok(()) => true,
            Err(err) => {
                error!(
                    to = %message.to,
                    subject = %message.subject,
                    error = %err,
                    "notification delivery failed"
                );
                false
            }
        }
    }
}

/// Render the two body representations. Field values reach this point
/// already sanitized to plain text by the validation layer.
fn render(
    to: String,
    subject: String,
    greeting: &str,
    heading: &str,
    lines: &[(&str, String)],
) -> EmailMessage {
    let mut html = format!("<h2>{}</h2><p>{}</p><table>", heading, greeting);
    let mut text = format!("{}\n\n{}\n\n", greeting, heading);
    for (label, value) in lines {
        html.push_str(&format!(
            "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
            label, value
        ));
        text.push_str(&format!("{}: {}\n", label, value));
    }
    html.push_str("</table>");

    EmailMessage {
        to,
        subject,
        html,
        text,
    }
}
