use axum::{middleware::from_fn_with_state, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod service;

use handlers::{bookings, providers};
use service::BookingService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub bookings: BookingService,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let bookings = BookingService::new(db.clone());
        Self { db, bookings }
    }
}

/// Builds the application router: a public catalog surface and the
/// customer-authenticated booking surface.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .nest("/api/service-providers", providers::router())
        .with_state(state.clone());

    let customer_routes = Router::new()
        .nest("/api/customer/booking-requests", bookings::router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::customer_auth_middleware,
        ))
        .with_state(state);

    public_routes
        .merge(customer_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
