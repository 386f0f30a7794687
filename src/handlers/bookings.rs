use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use validator::Validate;

use crate::errors::AppError;
use crate::models::{
    BookingRequestDetail, CreateBookingRequestPayload, Customer, PageParams, Paginated,
};
use crate::repository;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(store))
        .route("/:booking_request_id", get(show))
        .route("/:booking_request_id/submit", post(submit))
        .route("/:booking_request_id/cancel", post(cancel))
}

/// GET /api/customer/booking-requests
async fn index(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<BookingRequestDetail>>, AppError> {
    let page = state
        .bookings
        .list_booking_requests(&customer, params.page())
        .await?;
    Ok(Json(page))
}

/// POST /api/customer/booking-requests
async fn store(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(payload): Json<CreateBookingRequestPayload>,
) -> Result<(StatusCode, Json<BookingRequestDetail>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    validate_store_payload(&state, &payload).await?;

    let detail = state
        .bookings
        .create_booking_request(&customer, payload.service_provider_id, &payload.task_ids)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/customer/booking-requests/:booking_request_id
async fn show(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Path(booking_request_id): Path<i64>,
) -> Result<Json<BookingRequestDetail>, AppError> {
    let request = state
        .bookings
        .get_booking_request(&customer, booking_request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking request not found.".to_string()))?;

    let detail = state.bookings.load_booking_request(request.id).await?;
    Ok(Json(detail))
}

/// POST /api/customer/booking-requests/:booking_request_id/submit
async fn submit(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Path(booking_request_id): Path<i64>,
) -> Result<Json<BookingRequestDetail>, AppError> {
    let request = state
        .bookings
        .get_booking_request(&customer, booking_request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking request not found.".to_string()))?;

    let detail = state.bookings.submit_booking_request(&request).await?;
    Ok(Json(detail))
}

/// POST /api/customer/booking-requests/:booking_request_id/cancel
async fn cancel(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Path(booking_request_id): Path<i64>,
) -> Result<Json<BookingRequestDetail>, AppError> {
    let request = state
        .bookings
        .get_booking_request(&customer, booking_request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking request not found.".to_string()))?;

    let detail = state.bookings.cancel_booking_request(&request).await?;
    Ok(Json(detail))
}

/// Shape checks the booking core assumes already hold: distinct task ids,
/// an existing provider, and every task belonging to that provider.
async fn validate_store_payload(
    state: &AppState,
    payload: &CreateBookingRequestPayload,
) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    if !payload.task_ids.iter().all(|id| seen.insert(*id)) {
        return Err(AppError::Validation(
            "Duplicate tasks are not allowed in the same booking request.".to_string(),
        ));
    }

    let mut conn = state.db.acquire().await?;

    repository::find_service_provider(&mut conn, payload.service_provider_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation("The selected service provider does not exist.".to_string())
        })?;

    let matching =
        repository::count_tasks_of_provider(&mut conn, payload.service_provider_id, &payload.task_ids)
            .await?;
    if matching != payload.task_ids.len() as i64 {
        return Err(AppError::Validation(
            "One or more selected tasks are invalid or do not belong to the selected service provider."
                .to_string(),
        ));
    }

    Ok(())
}
