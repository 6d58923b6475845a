//! Closed value sets shared by validation, services and the HTTP surface.
//!
//! Stored as plain strings in the database; parsed through these enums so an
//! unknown value is always a validation error, never silently coerced.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Penthouse,
    Studio,
    Duplex,
    Villa,
    Plot,
    Commercial,
    Office,
    Garage,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyStatus {
    PendingReview,
    Active,
    Sold,
    Rented,
    Withdrawn,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadKind {
    Valuation,
    Contact,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Closed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceType {
    Sale,
    Rental,
    Management,
    Valuation,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl InvoiceStatus {
    /// Terminal statuses cannot be transitioned out of.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_round_trip_through_strings() {
        assert_eq!(PropertyType::Penthouse.to_string(), "penthouse");
        assert_eq!(
            PropertyType::from_str("penthouse").unwrap(),
            PropertyType::Penthouse
        );
        assert_eq!(InvoiceStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            InvoiceStatus::from_str("in_progress").unwrap(),
            InvoiceStatus::InProgress
        );
    }

    #[test]
    fn unknown_values_do_not_parse() {
        assert!(PropertyType::from_str("castle").is_err());
        assert!(InvoiceStatus::from_str("done").is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(InvoiceStatus::Completed.is_terminal());
        assert!(InvoiceStatus::Rejected.is_terminal());
        assert!(!InvoiceStatus::Pending.is_terminal());
        assert!(!InvoiceStatus::InProgress.is_terminal());
    }
}
