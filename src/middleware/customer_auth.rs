use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::repository;
use crate::AppState;

/// Identifies the calling customer from the X-Customer-Id header and makes
/// the loaded `Customer` available to handlers as a request extension.
///
/// Header auth stands in for real authentication here; the booking core
/// only ever sees an already-resolved customer.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let customer_id = headers
        .get("X-Customer-Id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("X-Customer-Id header is required.".to_string()))?;

    let customer_id: i64 = customer_id
        .trim()
        .parse()
        .map_err(|_| AppError::Unauthorized("X-Customer-Id header is required.".to_string()))?;

    // Scope the connection so it is back in the pool before the handler runs
    let customer = {
        let mut conn = state.db.acquire().await?;
        repository::find_customer(&mut conn, customer_id).await?
    }
    .ok_or_else(|| AppError::NotFound("Customer not found.".to_string()))?;

    request.extensions_mut().insert(customer);

    Ok(next.run(request).await)
}
