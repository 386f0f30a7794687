use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A customer account, resolved by the auth middleware from the
/// X-Customer-Id header. Never mutated by the booking core.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only catalog entry for a business offering tasks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceProvider {
    pub id: i64,
    pub business_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// A single chargeable service with a fixed price. Immutable reference
/// data; belongs to exactly one service provider.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub service_provider_id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}
