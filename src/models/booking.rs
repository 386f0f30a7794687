use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::catalog::{ServiceProvider, Task};

/// Lifecycle state of a booking request.
///
/// `pending` is the only non-terminal state: a request moves exactly once
/// to `submitted` or `cancelled` and never leaves either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingRequestStatus {
    Pending,
    Submitted,
    Cancelled,
}

impl BookingRequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookingRequestStatus::Pending => "Pending",
            BookingRequestStatus::Submitted => "Submitted",
            BookingRequestStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BookingRequestStatus::Pending)
    }
}

/// Quote state. Nothing in the booking core moves a quote past
/// `generated`; the other variants exist for the acceptance flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quote_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Generated,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn label(&self) -> &'static str {
        match self {
            QuoteStatus::Generated => "Generated",
            QuoteStatus::Accepted => "Accepted",
            QuoteStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingRequest {
    pub id: i64,
    pub customer_id: i64,
    pub service_provider_id: i64,
    pub status: BookingRequestStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRequest {
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Quote {
    pub id: i64,
    #[serde(skip_serializing)]
    pub booking_request_id: i64,
    pub price: Decimal,
    pub status: QuoteStatus,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// A booking request with its provider, tasks, and quote eagerly loaded.
/// This is the shape every booking endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequestDetail {
    pub id: i64,
    pub status: BookingRequestStatus,
    pub status_label: &'static str,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service_provider: ServiceProvider,
    pub tasks: Vec<Task>,
    pub quote: Option<Quote>,
}

impl BookingRequestDetail {
    pub fn assemble(
        request: BookingRequest,
        service_provider: ServiceProvider,
        tasks: Vec<Task>,
        quote: Option<Quote>,
    ) -> Self {
        Self {
            id: request.id,
            status: request.status,
            status_label: request.status.label(),
            submitted_at: request.submitted_at,
            created_at: request.created_at,
            updated_at: request.updated_at,
            service_provider,
            tasks,
            quote,
        }
    }
}

/// Payload for POST /api/customer/booking-requests.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequestPayload {
    pub service_provider_id: i64,
    #[validate(length(min = 1, message = "At least one task must be selected."))]
    pub task_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(BookingRequestStatus::Pending.label(), "Pending");
        assert_eq!(BookingRequestStatus::Submitted.label(), "Submitted");
        assert_eq!(BookingRequestStatus::Cancelled.label(), "Cancelled");
        assert_eq!(QuoteStatus::Generated.label(), "Generated");
    }

    #[test]
    fn only_pending_is_pending() {
        assert!(BookingRequestStatus::Pending.is_pending());
        assert!(!BookingRequestStatus::Submitted.is_pending());
        assert!(!BookingRequestStatus::Cancelled.is_pending());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingRequestStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let json = serde_json::to_string(&QuoteStatus::Generated).unwrap();
        assert_eq!(json, "\"generated\"");
    }
}
