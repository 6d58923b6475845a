//! Schema validation and sanitization for public submissions.
//!
//! Every function here is pure: given the same payload it returns the same
//! result, performs no I/O, and never panics across the boundary. A payload
//! either becomes a fully typed, sanitized value or a [`FieldErrors`] map
//! listing *every* violation, so callers can fix a form in one round trip.
//!
//! All free-text input is trimmed and stripped of markup before any check
//! runs. Nothing that reaches persistence or an email body contains tags.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{InvoiceStatus, InvoiceType, LeadStatus, PropertyStatus, PropertyType};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const ADDRESS_MIN: usize = 5;
pub const ADDRESS_MAX: usize = 200;
pub const MESSAGE_MAX: usize = 1000;
pub const NOTES_MAX: usize = 5000;
pub const SUBJECT_MAX: usize = 150;
pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 150;
pub const DESCRIPTION_MAX: usize = 5000;
pub const CITY_MIN: usize = 2;
pub const CITY_MAX: usize = 100;
pub const YEAR_BUILT_MIN: i32 = 1800;
pub const BEDROOMS_MAX: i64 = 20;
pub const BATHROOMS_MAX: i64 = 15;
pub const SQUARE_METERS_MIN: i64 = 1;
pub const SQUARE_METERS_MAX: i64 = 10_000;
pub const FLOOR_MIN: i64 = -2;
pub const FLOOR_MAX: i64 = 60;
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

static PRICE_MAX: Lazy<Decimal> = Lazy::new(|| Decimal::from(100_000_000u64));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap());

/// Spanish mobile/landline grammar, optional +34 prefix.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+34)?[6-9]\d{8}$").unwrap());

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Field path → human-readable message, collected across an entire payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Turn accumulated errors into a result carrying the typed value.
    fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Strip markup down to plain text. Script and style elements are removed
/// together with their content; every other tag is dropped; the remainder
/// is trimmed.
pub fn strip_markup(input: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(input, "");
    let without_styles = STYLE_RE.replace_all(&without_scripts, "");
    let without_tags = TAG_RE.replace_all(&without_styles, "");
    without_tags.trim().to_string()
}

/// Trim + markup-strip. Applied to every inbound string field before checks.
fn clean(input: &str) -> String {
    strip_markup(input)
}

fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean).filter(|s| !s.is_empty())
}

/// Clean a required string field, recording an error when absent/empty.
fn require(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match clean_optional(value) {
        Some(v) => Some(v),
        None => {
            errors.push(field, "is required");
            None
        }
    }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(
            field,
            format!("must be between {} and {} characters", min, max),
        );
    }
}

fn check_max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("must be at most {} characters", max));
    }
}

/// Validate and normalize an email address (lower-cased).
fn check_email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let normalized = value.to_ascii_lowercase();
    if EMAIL_RE.is_match(&normalized) {
        Some(normalized)
    } else {
        errors.push(field, "must be a valid email address");
        None
    }
}

fn check_phone(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if PHONE_RE.is_match(&compact) {
        Some(compact)
    } else {
        errors.push(field, "must be a Spanish phone number, e.g. 612345678");
        None
    }
}

/// Parse against a closed set; unknown values become field errors.
fn parse_enum<T: FromStr>(errors: &mut FieldErrors, field: &str, value: &str) -> Option<T> {
    match T::from_str(&value.trim().to_ascii_lowercase()) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(field, "is not a recognized value");
            None
        }
    }
}

fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i64, max: i64) -> bool {
    if value < min || value > max {
        errors.push(field, format!("must be between {} and {}", min, max));
        false
    } else {
        true
    }
}

// ---------------------------------------------------------------------------
// Valuation requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ValuationRequestPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub property_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub property_type: Option<PropertyType>,
    pub message: Option<String>,
}

pub fn validate_valuation_request(
    payload: &ValuationRequestPayload,
) -> Result<ValuationSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = require(&mut errors, "name", payload.name.as_deref());
    if let Some(name) = &name {
        check_length(&mut errors, "name", name, NAME_MIN, NAME_MAX);
    }

    let email = require(&mut errors, "email", payload.email.as_deref())
        .and_then(|v| check_email(&mut errors, "email", &v));

    let phone = require(&mut errors, "phone", payload.phone.as_deref())
        .and_then(|v| check_phone(&mut errors, "phone", &v));

    let address = require(&mut errors, "address", payload.address.as_deref());
    if let Some(address) = &address {
        check_length(&mut errors, "address", address, ADDRESS_MIN, ADDRESS_MAX);
    }

    let property_type = clean_optional(payload.property_type.as_deref())
        .and_then(|v| parse_enum::<PropertyType>(&mut errors, "property_type", &v));

    let message = clean_optional(payload.message.as_deref());
    if let Some(message) = &message {
        check_max_length(&mut errors, "message", message, MESSAGE_MAX);
    }

    let submission = ValuationSubmission {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        address: address.unwrap_or_default(),
        property_type,
        message,
    };
    errors.finish(submission)
}

// ---------------------------------------------------------------------------
// Contact requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContactRequestPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub property_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub property_id: Option<Uuid>,
}

pub fn validate_contact_request(
    payload: &ContactRequestPayload,
) -> Result<ContactSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = require(&mut errors, "name", payload.name.as_deref());
    if let Some(name) = &name {
        check_length(&mut errors, "name", name, NAME_MIN, NAME_MAX);
    }

    let email = require(&mut errors, "email", payload.email.as_deref())
        .and_then(|v| check_email(&mut errors, "email", &v));

    // Phone is optional here, but when present it must still parse.
    let phone = clean_optional(payload.phone.as_deref())
        .and_then(|v| check_phone(&mut errors, "phone", &v));

    let subject = clean_optional(payload.subject.as_deref());
    if let Some(subject) = &subject {
        check_max_length(&mut errors, "subject", subject, SUBJECT_MAX);
    }

    let message = require(&mut errors, "message", payload.message.as_deref());
    if let Some(message) = &message {
        check_max_length(&mut errors, "message", message, MESSAGE_MAX);
    }

    let submission = ContactSubmission {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone,
        subject,
        message: message.unwrap_or_default(),
        property_id: payload.property_id,
    };
    errors.finish(submission)
}

// ---------------------------------------------------------------------------
// Invoice requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InvoiceRequestPayload {
    pub invoice_type: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSubmission {
    pub invoice_type: InvoiceType,
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

pub fn validate_invoice_request(
    payload: &InvoiceRequestPayload,
) -> Result<InvoiceSubmission, FieldErrors> {
    let mut errors = FieldErrors::default();

    let invoice_type = require(&mut errors, "invoice_type", payload.invoice_type.as_deref())
        .and_then(|v| parse_enum::<InvoiceType>(&mut errors, "invoice_type", &v));

    if let Some(amount) = payload.amount {
        if amount <= Decimal::ZERO || amount > *PRICE_MAX {
            errors.push("amount", "must be positive and at most 100000000");
        }
    }

    let notes = clean_optional(payload.notes.as_deref());
    if let Some(notes) = &notes {
        check_max_length(&mut errors, "notes", notes, NOTES_MAX);
    }

    let submission = InvoiceSubmission {
        invoice_type: invoice_type.unwrap_or(InvoiceType::Other),
        amount: payload.amount,
        notes,
    };
    errors.finish(submission)
}

/// Parse a requested invoice-status transition value.
pub fn validate_invoice_status(value: &str) -> Result<InvoiceStatus, FieldErrors> {
    let mut errors = FieldErrors::default();
    let status = parse_enum::<InvoiceStatus>(&mut errors, "status", value);
    errors.finish(status.unwrap_or(InvoiceStatus::Pending))
}

/// Parse a requested lead-status transition value.
pub fn validate_lead_status(value: &str) -> Result<LeadStatus, FieldErrors> {
    let mut errors = FieldErrors::default();
    let status = parse_enum::<LeadStatus>(&mut errors, "status", value);
    errors.finish(status.unwrap_or(LeadStatus::New))
}

// ---------------------------------------------------------------------------
// Property create / update
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PropertyPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub square_meters: Option<i64>,
    pub year_built: Option<i64>,
    pub floor: Option<i64>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDraft {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub bedrooms: i16,
    pub bathrooms: i16,
    pub square_meters: i32,
    pub year_built: Option<i16>,
    pub floor: Option<i16>,
    pub property_type: PropertyType,
    pub status: Option<PropertyStatus>,
    pub address: String,
    pub city: String,
}

pub fn validate_property_payload(payload: &PropertyPayload) -> Result<PropertyDraft, FieldErrors> {
    let mut errors = FieldErrors::default();

    let title = require(&mut errors, "title", payload.title.as_deref());
    if let Some(title) = &title {
        check_length(&mut errors, "title", title, TITLE_MIN, TITLE_MAX);
    }

    let description = clean_optional(payload.description.as_deref());
    if let Some(description) = &description {
        check_max_length(&mut errors, "description", description, DESCRIPTION_MAX);
    }

    let price = match payload.price {
        Some(price) if price > Decimal::ZERO && price <= *PRICE_MAX => Some(price),
        Some(_) => {
            errors.push("price", "must be positive and at most 100000000");
            None
        }
        None => {
            errors.push("price", "is required");
            None
        }
    };

    let bedrooms = match payload.bedrooms {
        Some(n) if check_range(&mut errors, "bedrooms", n, 0, BEDROOMS_MAX) => Some(n as i16),
        Some(_) => None,
        None => {
            errors.push("bedrooms", "is required");
            None
        }
    };

    let bathrooms = match payload.bathrooms {
        Some(n) if check_range(&mut errors, "bathrooms", n, 0, BATHROOMS_MAX) => Some(n as i16),
        Some(_) => None,
        None => {
            errors.push("bathrooms", "is required");
            None
        }
    };

    let square_meters = match payload.square_meters {
        Some(n) if check_range(
            &mut errors,
            "square_meters",
            n,
            SQUARE_METERS_MIN,
            SQUARE_METERS_MAX,
        ) =>
        {
            Some(n as i32)
        }
        Some(_) => None,
        None => {
            errors.push("square_meters", "is required");
            None
        }
    };

    let year_max = i64::from(chrono::Utc::now().year() + 5);
    let year_built = match payload.year_built {
        Some(n) if check_range(
            &mut errors,
            "year_built",
            n,
            i64::from(YEAR_BUILT_MIN),
            year_max,
        ) =>
        {
            Some(n as i16)
        }
        _ => None,
    };

    let floor = match payload.floor {
        Some(n) if check_range(&mut errors, "floor", n, FLOOR_MIN, FLOOR_MAX) => Some(n as i16),
        _ => None,
    };

    let property_type = require(&mut errors, "property_type", payload.property_type.as_deref())
        .and_then(|v| parse_enum::<PropertyType>(&mut errors, "property_type", &v));

    let status = clean_optional(payload.status.as_deref())
        .and_then(|v| parse_enum::<PropertyStatus>(&mut errors, "status", &v));

    let address = require(&mut errors, "address", payload.address.as_deref());
    if let Some(address) = &address {
        check_length(&mut errors, "address", address, ADDRESS_MIN, ADDRESS_MAX);
    }

    let city = require(&mut errors, "city", payload.city.as_deref());
    if let Some(city) = &city {
        check_length(&mut errors, "city", city, CITY_MIN, CITY_MAX);
    }

    let draft = PropertyDraft {
        title: title.unwrap_or_default(),
        description,
        price: price.unwrap_or_default(),
        bedrooms: bedrooms.unwrap_or_default(),
        bathrooms: bathrooms.unwrap_or_default(),
        square_meters: square_meters.unwrap_or_default(),
        year_built,
        floor,
        property_type: property_type.unwrap_or(PropertyType::Apartment),
        status,
        address: address.unwrap_or_default(),
        city: city.unwrap_or_default(),
    };
    errors.finish(draft)
}

// ---------------------------------------------------------------------------
// Image metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ImageMetadataPayload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

pub fn validate_image_metadata(
    payload: &ImageMetadataPayload,
) -> Result<ImageMetadata, FieldErrors> {
    let mut errors = FieldErrors::default();

    let file_name = require(&mut errors, "file_name", payload.file_name.as_deref());
    if let Some(file_name) = &file_name {
        check_max_length(&mut errors, "file_name", file_name, 255);
    }

    let content_type = require(&mut errors, "content_type", payload.content_type.as_deref())
        .map(|v| v.to_ascii_lowercase());
    if let Some(ct) = &content_type {
        if !ALLOWED_IMAGE_TYPES.contains(&ct.as_str()) {
            errors.push("content_type", "must be one of image/jpeg, image/png, image/webp");
        }
    }

    let size_bytes = match payload.size_bytes {
        Some(size) if size > 0 && size <= MAX_IMAGE_BYTES => Some(size),
        Some(_) => {
            errors.push("size_bytes", "must be between 1 byte and 10 MiB");
            None
        }
        None => {
            errors.push("size_bytes", "is required");
            None
        }
    };

    let metadata = ImageMetadata {
        file_name: file_name.unwrap_or_default(),
        content_type: content_type.unwrap_or_default(),
        size_bytes: size_bytes.unwrap_or_default(),
    };
    errors.finish(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation_payload() -> ValuationRequestPayload {
        ValuationRequestPayload {
            name: Some("  María García  ".into()),
            email: Some("Maria.Garcia@Example.COM".into()),
            phone: Some("612 345 678".into()),
            address: Some("Calle de Serrano 21, Madrid".into()),
            property_type: Some("apartment".into()),
            message: Some("Ático en Salamanca, 3 habs".into()),
        }
    }

    #[test]
    fn valuation_happy_path_trims_and_normalizes() {
        let submission = validate_valuation_request(&valuation_payload()).unwrap();
        assert_eq!(submission.name, "María García");
        assert_eq!(submission.email, "maria.garcia@example.com");
        assert_eq!(submission.phone, "612345678");
        assert_eq!(submission.property_type, Some(PropertyType::Apartment));
        assert_eq!(submission.message.as_deref(), Some("Ático en Salamanca, 3 habs"));
    }

    #[test]
    fn spanish_phone_grammar() {
        let mut payload = valuation_payload();
        payload.phone = Some("+34912345678".into());
        assert!(validate_valuation_request(&payload).is_ok());

        payload.phone = Some("12345".into());
        let errors = validate_valuation_request(&payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("phone").unwrap().contains("Spanish phone"));

        // Leading digit outside 6-9 is not a Spanish subscriber number.
        payload.phone = Some("512345678".into());
        assert!(validate_valuation_request(&payload).is_err());
    }

    #[test]
    fn all_violations_reported_together() {
        let payload = ValuationRequestPayload {
            name: Some("A".into()),
            email: Some("not-an-email".into()),
            phone: Some("12345".into()),
            address: Some("x".into()),
            property_type: Some("castle".into()),
            message: None,
        };
        let errors = validate_valuation_request(&payload).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("address").is_some());
        assert!(errors.get("property_type").is_some());
    }

    #[test]
    fn validation_is_deterministic() {
        let payload = ValuationRequestPayload {
            name: None,
            email: Some("broken".into()),
            ..Default::default()
        };
        let first = validate_valuation_request(&payload).unwrap_err();
        let second = validate_valuation_request(&payload).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn script_tags_never_survive() {
        let mut payload = valuation_payload();
        payload.message = Some("hola <script>alert(1)</script> adiós".into());
        let submission = validate_valuation_request(&payload).unwrap();
        assert_eq!(submission.message.as_deref(), Some("hola  adiós"));

        payload.message = Some("<b>negrita</b> y <SCRIPT type=\"text/javascript\">evil()</SCRIPT>".into());
        let submission = validate_valuation_request(&payload).unwrap();
        let message = submission.message.unwrap();
        assert!(!message.contains('<'));
        assert!(!message.contains("evil"));
        assert!(message.contains("negrita"));
    }

    #[test]
    fn unclosed_script_tag_is_still_disarmed() {
        let stripped = strip_markup("<script>alert(1)");
        assert!(!stripped.contains('<'));
        assert!(!stripped.contains("script"));
    }

    #[test]
    fn unicode_text_passes_through_unchanged() {
        assert_eq!(strip_markup("  Ático en Salamanca, 3 habs  "), "Ático en Salamanca, 3 habs");
    }

    #[test]
    fn contact_requires_message_but_not_phone() {
        let payload = ContactRequestPayload {
            name: Some("Juan".into()),
            email: Some("juan@example.com".into()),
            phone: None,
            subject: Some("Visita".into()),
            message: Some("Me interesa el piso".into()),
            property_id: None,
        };
        let submission = validate_contact_request(&payload).unwrap();
        assert!(submission.phone.is_none());

        let payload = ContactRequestPayload {
            message: None,
            ..payload
        };
        let errors = validate_contact_request(&payload).unwrap_err();
        assert_eq!(errors.get("message"), Some("is required"));
    }

    #[test]
    fn contact_message_over_limit_is_rejected() {
        let payload = ContactRequestPayload {
            name: Some("Juan".into()),
            email: Some("juan@example.com".into()),
            message: Some("x".repeat(MESSAGE_MAX + 1)),
            ..Default::default()
        };
        let errors = validate_contact_request(&payload).unwrap_err();
        assert!(errors.get("message").unwrap().contains("at most"));
    }

    #[test]
    fn invoice_type_is_a_closed_set() {
        let payload = InvoiceRequestPayload {
            invoice_type: Some("sale".into()),
            amount: Some(Decimal::new(150_000, 2)),
            notes: None,
        };
        let submission = validate_invoice_request(&payload).unwrap();
        assert_eq!(submission.invoice_type, InvoiceType::Sale);

        let payload = InvoiceRequestPayload {
            invoice_type: Some("barter".into()),
            ..Default::default()
        };
        let errors = validate_invoice_request(&payload).unwrap_err();
        assert!(errors.get("invoice_type").is_some());
    }

    #[test]
    fn invoice_status_parse_is_case_insensitive() {
        assert_eq!(
            validate_invoice_status("COMPLETED").unwrap(),
            InvoiceStatus::Completed
        );
        assert!(validate_invoice_status("done").is_err());
    }

    #[test]
    fn property_payload_collects_numeric_violations() {
        let payload = PropertyPayload {
            title: Some("Piso luminoso en Chamberí".into()),
            price: Some(Decimal::from(-5)),
            bedrooms: Some(42),
            bathrooms: Some(3),
            square_meters: Some(0),
            year_built: Some(1650),
            property_type: Some("apartment".into()),
            address: Some("Calle de Fuencarral 10".into()),
            city: Some("Madrid".into()),
            ..Default::default()
        };
        let errors = validate_property_payload(&payload).unwrap_err();
        assert!(errors.get("price").is_some());
        assert!(errors.get("bedrooms").is_some());
        assert!(errors.get("square_meters").is_some());
        assert!(errors.get("year_built").is_some());
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn property_happy_path() {
        let payload = PropertyPayload {
            title: Some("Ático con terraza".into()),
            description: Some("Reformado en 2021.".into()),
            price: Some(Decimal::from(495_000)),
            bedrooms: Some(3),
            bathrooms: Some(2),
            square_meters: Some(120),
            year_built: Some(1978),
            floor: Some(6),
            property_type: Some("penthouse".into()),
            status: None,
            address: Some("Calle de Alcalá 200".into()),
            city: Some("Madrid".into()),
        };
        let draft = validate_property_payload(&payload).unwrap();
        assert_eq!(draft.property_type, PropertyType::Penthouse);
        assert_eq!(draft.bedrooms, 3);
        assert_eq!(draft.year_built, Some(1978));
        assert!(draft.status.is_none());
    }

    #[test]
    fn image_metadata_limits() {
        let payload = ImageMetadataPayload {
            file_name: Some("salon.jpg".into()),
            content_type: Some("image/jpeg".into()),
            size_bytes: Some(2 * 1024 * 1024),
        };
        assert!(validate_image_metadata(&payload).is_ok());

        let payload = ImageMetadataPayload {
            file_name: Some("video.mp4".into()),
            content_type: Some("video/mp4".into()),
            size_bytes: Some(MAX_IMAGE_BYTES + 1),
        };
        let errors = validate_image_metadata(&payload).unwrap_err();
        assert!(errors.get("content_type").is_some());
        assert!(errors.get("size_bytes").is_some());
    }
}
