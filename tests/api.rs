//! HTTP-level tests: routing, auth middleware, status codes, and response
//! body shapes.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use booking_backend::{app, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::util::ServiceExt;

use common::{create_customer, create_provider, create_task};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    customer_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = customer_id {
        builder = builder.header("X-Customer-Id", id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[sqlx::test]
async fn store_returns_created_aggregate(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let task_ids = vec![
        create_task(&pool, provider, "Window cleaning", "25.00").await,
        create_task(&pool, provider, "Carpet cleaning", "25.00").await,
        create_task(&pool, provider, "Oven cleaning", "25.00").await,
    ];

    let (status, body) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": task_ids })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["status_label"], "Pending");
    assert!(body["submitted_at"].is_null());
    assert_eq!(body["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(body["service_provider"]["business_name"], "Sparkle Cleaning");
    assert_eq!(body["quote"]["price"], "75.00");
    assert_eq!(body["quote"]["status"], "generated");
}

#[sqlx::test]
async fn duplicate_task_returns_409_with_detail(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let booked = create_task(&pool, provider, "Window cleaning", "30.00").await;
    let fresh = create_task(&pool, provider, "Oven cleaning", "45.00").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [booked] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [booked, fresh] })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Cannot add tasks that already exist in other pending booking requests"
    );
    assert_eq!(body["duplicate_task_ids"], json!([booked]));
    assert_eq!(body["duplicate_task_names"], json!(["Window cleaning"]));
}

#[sqlx::test]
async fn submit_then_resubmit_returns_422(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let task = create_task(&pool, provider, "Window cleaning", "30.00").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [task] })),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let uri = format!("/api/customer/booking-requests/{id}/submit");
    let (status, body) = send(&app, "POST", &uri, Some(customer.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");
    assert!(!body["submitted_at"].is_null());

    let (status, body) = send(&app, "POST", &uri, Some(customer.id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Only pending booking requests can be submitted."
    );
}

#[sqlx::test]
async fn cancel_keeps_submitted_at_null(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let task = create_task(&pool, provider, "Window cleaning", "30.00").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [task] })),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let uri = format!("/api/customer/booking-requests/{id}/cancel");
    let (status, body) = send(&app, "POST", &uri, Some(customer.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert!(body["submitted_at"].is_null());
}

#[sqlx::test]
async fn missing_or_unknown_customer_is_rejected(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));

    let (status, body) = send(&app, "GET", "/api/customer/booking-requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "X-Customer-Id header is required.");

    let (status, body) =
        send(&app, "GET", "/api/customer/booking-requests", Some(9999), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Customer not found.");
}

#[sqlx::test]
async fn store_payload_validation_returns_422(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let other_provider = create_provider(&pool, "Green Gardens").await;
    let foreign_task = create_task(&pool, other_provider, "Hedge trimming", "20.00").await;

    // Empty task list
    let (status, _) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown provider
    let (status, _) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": 9999, "task_ids": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Task belongs to a different provider
    let (status, _) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [foreign_task] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Repeated task in the same payload
    let task = create_task(&pool, provider, "Window cleaning", "30.00").await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [task, task] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test]
async fn customers_never_see_each_others_requests(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let owner = create_customer(&pool, "Ada").await;
    let intruder = create_customer(&pool, "Grace").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let task = create_task(&pool, provider, "Window cleaning", "30.00").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(owner.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [task] })),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let uri = format!("/api/customer/booking-requests/{id}");
    let (status, _) = send(&app, "GET", &uri, Some(intruder.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/customer/booking-requests/{id}/submit");
    let (status, _) = send(&app, "POST", &uri, Some(intruder.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test]
async fn listing_returns_pagination_metadata(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let customer = create_customer(&pool, "Ada").await;
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    let task = create_task(&pool, provider, "Window cleaning", "30.00").await;

    send(
        &app,
        "POST",
        "/api/customer/booking-requests",
        Some(customer.id),
        Some(json!({ "service_provider_id": provider, "task_ids": [task] })),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/customer/booking-requests",
        Some(customer.id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_page"], 1);
    assert_eq!(body["last_page"], 1);
    assert_eq!(body["per_page"], 15);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test]
async fn catalog_endpoints_serve_providers_and_tasks(pool: PgPool) {
    let app = app(AppState::new(pool.clone()));
    let provider = create_provider(&pool, "Sparkle Cleaning").await;
    create_task(&pool, provider, "Window cleaning", "30.00").await;
    create_task(&pool, provider, "Oven cleaning", "45.00").await;

    let (status, body) = send(&app, "GET", "/api/service-providers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body.as_array().unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0]["business_name"], "Sparkle Cleaning");

    let uri = format!("/api/service-providers/{provider}/tasks");
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["name"], "Window cleaning");
    assert_eq!(tasks[0]["price"], "30.00");

    let (status, _) = send(&app, "GET", "/api/service-providers/9999/tasks", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
