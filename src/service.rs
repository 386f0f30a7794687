//! The booking lifecycle engine: the creation transaction and the
//! pending → submitted / cancelled transitions.

use chrono::Utc;
use sqlx::PgPool;

use crate::errors::{AppError, Result};
use crate::models::{
    BookingRequest, BookingRequestDetail, BookingRequestStatus, Customer, Paginated,
};
use crate::repository;

#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
}

impl BookingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a booking request with its task associations and quote in
    /// one transaction.
    ///
    /// The caller has already validated that every task exists and belongs
    /// to `service_provider_id`; this enforces only the pending-duplicate
    /// invariant. On conflict nothing is written and the error carries the
    /// duplicate ids in caller order with `task_names` position-correlated.
    pub async fn create_booking_request(
        &self,
        customer: &Customer,
        service_provider_id: i64,
        task_ids: &[i64],
    ) -> Result<BookingRequestDetail> {
        let mut tx = self.db.begin().await?;

        repository::lock_customer_bookings(&mut tx, customer.id).await?;
        let pending_task_ids =
            repository::find_pending_task_ids_for_customer(&mut tx, customer.id).await?;

        let duplicate_task_ids: Vec<i64> = task_ids
            .iter()
            .copied()
            .filter(|id| pending_task_ids.contains(id))
            .collect();

        if !duplicate_task_ids.is_empty() {
            // Best-effort name resolution; the transaction rolls back on drop.
            let names = repository::task_names_for(&mut tx, &duplicate_task_ids).await?;
            let task_names = duplicate_task_ids
                .iter()
                .filter_map(|id| names.get(id).cloned())
                .collect();

            return Err(AppError::DuplicateTasks {
                task_ids: duplicate_task_ids,
                task_names,
            });
        }

        let request =
            repository::create_booking_request(&mut tx, customer.id, service_provider_id).await?;
        repository::attach_tasks(&mut tx, request.id, task_ids).await?;

        let total_price = repository::sum_task_prices(&mut tx, task_ids).await?;
        repository::create_quote(&mut tx, request.id, total_price).await?;

        let detail = repository::load_with_associations(&mut tx, request.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tx.commit().await?;

        tracing::info!(
            booking_request_id = detail.id,
            customer_id = customer.id,
            "created booking request"
        );

        Ok(detail)
    }

    /// pending → submitted. Stamps `submitted_at` once. Not idempotent:
    /// submitting an already-submitted request is an error.
    pub async fn submit_booking_request(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingRequestDetail> {
        if !request.is_pending() {
            return Err(AppError::InvalidTransition(
                "Only pending booking requests can be submitted.".to_string(),
            ));
        }

        let submitted_at = Utc::now();
        self.transition(
            request.id,
            BookingRequestStatus::Submitted,
            Some(submitted_at),
            "Only pending booking requests can be submitted.",
        )
        .await
    }

    /// pending → cancelled. `submitted_at` stays null.
    pub async fn cancel_booking_request(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingRequestDetail> {
        if !request.is_pending() {
            return Err(AppError::InvalidTransition(
                "Only pending booking requests can be cancelled.".to_string(),
            ));
        }

        self.transition(
            request.id,
            BookingRequestStatus::Cancelled,
            None,
            "Only pending booking requests can be cancelled.",
        )
        .await
    }

    async fn transition(
        &self,
        booking_request_id: i64,
        new_status: BookingRequestStatus,
        submitted_at: Option<chrono::DateTime<Utc>>,
        conflict_message: &str,
    ) -> Result<BookingRequestDetail> {
        let mut conn = self.db.acquire().await?;

        let updated = repository::update_status_if_pending(
            &mut conn,
            booking_request_id,
            new_status,
            submitted_at,
        )
        .await?;

        // 0 rows means another transition won the race since our read.
        if updated == 0 {
            return Err(AppError::InvalidTransition(conflict_message.to_string()));
        }

        repository::load_with_associations(&mut conn, booking_request_id)
            .await?
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn get_booking_request(
        &self,
        customer: &Customer,
        booking_request_id: i64,
    ) -> Result<Option<BookingRequest>> {
        let mut conn = self.db.acquire().await?;
        repository::find_owned(&mut conn, booking_request_id, customer.id).await
    }

    pub async fn load_booking_request(
        &self,
        booking_request_id: i64,
    ) -> Result<BookingRequestDetail> {
        let mut conn = self.db.acquire().await?;
        repository::load_with_associations(&mut conn, booking_request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking request not found.".to_string()))
    }

    /// The customer's booking requests, newest first, 15 per page.
    pub async fn list_booking_requests(
        &self,
        customer: &Customer,
        page: i64,
    ) -> Result<Paginated<BookingRequestDetail>> {
        let mut conn = self.db.acquire().await?;
        repository::list_for_customer(&mut conn, customer.id, page).await
    }
}
