#![allow(dead_code)]

use booking_backend::models::Customer;
use rust_decimal::Decimal;
use sqlx::PgPool;

pub async fn create_customer(pool: &PgPool, name: &str) -> Customer {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("insert customer")
}

pub async fn create_provider(pool: &PgPool, business_name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO service_providers (business_name) VALUES ($1) RETURNING id")
        .bind(business_name)
        .fetch_one(pool)
        .await
        .expect("insert service provider")
}

pub async fn create_task(pool: &PgPool, provider_id: i64, name: &str, price: &str) -> i64 {
    let price: Decimal = price.parse().expect("valid decimal price");
    sqlx::query_scalar(
        "INSERT INTO tasks (service_provider_id, name, price) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(provider_id)
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("insert task")
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}
