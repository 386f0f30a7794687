//! All SQL for the booking core. Functions take `&mut PgConnection` so the
//! lifecycle engine can compose them inside a single transaction.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::errors::{AppError, Result};
use crate::models::{
    BookingRequest, BookingRequestDetail, BookingRequestStatus, Customer, Paginated, Quote,
    ServiceProvider, Task, PER_PAGE,
};

const BOOKING_REQUEST_COLUMNS: &str =
    "id, customer_id, service_provider_id, status, submitted_at, created_at, updated_at";

const TASK_COLUMNS: &str = "id, service_provider_id, name, price, created_at, updated_at";

const QUOTE_COLUMNS: &str = "id, booking_request_id, price, status, created_at, updated_at";

/// Serializes booking-request creation per customer for the duration of the
/// surrounding transaction. A plain row lock on the pending reads is not
/// enough: two first-ever requests both read zero rows and neither blocks
/// the other.
pub async fn lock_customer_bookings(conn: &mut PgConnection, customer_id: i64) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(customer_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Every task id attached to any of the customer's pending booking
/// requests, read under a row lock on those requests.
pub async fn find_pending_task_ids_for_customer(
    conn: &mut PgConnection,
    customer_id: i64,
) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT brt.task_id
        FROM booking_requests br
        JOIN booking_request_tasks brt ON brt.booking_request_id = br.id
        WHERE br.customer_id = $1 AND br.status = 'pending'
        FOR UPDATE OF br
        "#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await?;

    Ok(ids.into_iter().collect())
}

pub async fn create_booking_request(
    conn: &mut PgConnection,
    customer_id: i64,
    service_provider_id: i64,
) -> Result<BookingRequest> {
    let request = sqlx::query_as::<_, BookingRequest>(&format!(
        r#"
        INSERT INTO booking_requests (customer_id, service_provider_id)
        VALUES ($1, $2)
        RETURNING {BOOKING_REQUEST_COLUMNS}
        "#
    ))
    .bind(customer_id)
    .bind(service_provider_id)
    .fetch_one(conn)
    .await?;

    Ok(request)
}

/// Attaches tasks to a booking request. The unique
/// (booking_request_id, task_id) constraint is the integrity backstop
/// behind the application-level duplicate check.
pub async fn attach_tasks(
    conn: &mut PgConnection,
    booking_request_id: i64,
    task_ids: &[i64],
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO booking_request_tasks (booking_request_id, task_id)
        SELECT $1, unnest($2::bigint[])
        "#,
    )
    .bind(booking_request_id)
    .bind(task_ids)
    .execute(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::ConstraintViolation(db.message().to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(())
}

pub async fn create_quote(
    conn: &mut PgConnection,
    booking_request_id: i64,
    price: Decimal,
) -> Result<Quote> {
    let quote = sqlx::query_as::<_, Quote>(&format!(
        r#"
        INSERT INTO quotes (booking_request_id, price)
        VALUES ($1, $2)
        RETURNING {QUOTE_COLUMNS}
        "#
    ))
    .bind(booking_request_id)
    .bind(price)
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::ConstraintViolation(db.message().to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(quote)
}

/// Single conditional update: the pending check and the write cannot
/// interleave with another transition. Returns the number of rows moved
/// (0 means the request was no longer pending).
pub async fn update_status_if_pending(
    conn: &mut PgConnection,
    booking_request_id: i64,
    new_status: BookingRequestStatus,
    submitted_at: Option<DateTime<Utc>>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE booking_requests
        SET status = $2, submitted_at = $3, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(booking_request_id)
    .bind(new_status)
    .bind(submitted_at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Exact NUMERIC sum of the given tasks' prices.
pub async fn sum_task_prices(conn: &mut PgConnection, task_ids: &[i64]) -> Result<Decimal> {
    let total: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(price), 0) FROM tasks WHERE id = ANY($1)")
            .bind(task_ids)
            .fetch_one(conn)
            .await?;

    Ok(total)
}

/// Task names keyed by id, used to enrich duplicate-conflict messages.
pub async fn task_names_for(
    conn: &mut PgConnection,
    task_ids: &[i64],
) -> Result<HashMap<i64, String>> {
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM tasks WHERE id = ANY($1)")
            .bind(task_ids)
            .fetch_all(conn)
            .await?;

    Ok(rows.into_iter().collect())
}

pub async fn find_owned(
    conn: &mut PgConnection,
    booking_request_id: i64,
    customer_id: i64,
) -> Result<Option<BookingRequest>> {
    let request = sqlx::query_as::<_, BookingRequest>(&format!(
        "SELECT {BOOKING_REQUEST_COLUMNS} FROM booking_requests WHERE id = $1 AND customer_id = $2"
    ))
    .bind(booking_request_id)
    .bind(customer_id)
    .fetch_optional(conn)
    .await?;

    Ok(request)
}

/// Loads a booking request with its provider, tasks, and quote.
pub async fn load_with_associations(
    conn: &mut PgConnection,
    booking_request_id: i64,
) -> Result<Option<BookingRequestDetail>> {
    let request = sqlx::query_as::<_, BookingRequest>(&format!(
        "SELECT {BOOKING_REQUEST_COLUMNS} FROM booking_requests WHERE id = $1"
    ))
    .bind(booking_request_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(request) = request else {
        return Ok(None);
    };

    let service_provider = sqlx::query_as::<_, ServiceProvider>(
        "SELECT id, business_name, created_at, updated_at FROM service_providers WHERE id = $1",
    )
    .bind(request.service_provider_id)
    .fetch_one(&mut *conn)
    .await?;

    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT t.id, t.service_provider_id, t.name, t.price, t.created_at, t.updated_at
        FROM booking_request_tasks brt
        JOIN tasks t ON t.id = brt.task_id
        WHERE brt.booking_request_id = $1
        ORDER BY brt.id
        "#,
    )
    .bind(booking_request_id)
    .fetch_all(&mut *conn)
    .await?;

    let quote = sqlx::query_as::<_, Quote>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE booking_request_id = $1"
    ))
    .bind(booking_request_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(Some(BookingRequestDetail::assemble(
        request,
        service_provider,
        tasks,
        quote,
    )))
}

/// One page of the customer's booking requests, newest first, with
/// providers, tasks, and quotes batch-loaded for the page.
pub async fn list_for_customer(
    conn: &mut PgConnection,
    customer_id: i64,
    page: i64,
) -> Result<Paginated<BookingRequestDetail>> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM booking_requests WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&mut *conn)
            .await?;

    let requests = sqlx::query_as::<_, BookingRequest>(&format!(
        r#"
        SELECT {BOOKING_REQUEST_COLUMNS}
        FROM booking_requests
        WHERE customer_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(customer_id)
    .bind(PER_PAGE)
    .bind((page - 1) * PER_PAGE)
    .fetch_all(&mut *conn)
    .await?;

    let request_ids: Vec<i64> = requests.iter().map(|r| r.id).collect();
    let provider_ids: Vec<i64> = requests.iter().map(|r| r.service_provider_id).collect();

    let providers: HashMap<i64, ServiceProvider> = sqlx::query_as::<_, ServiceProvider>(
        "SELECT id, business_name, created_at, updated_at FROM service_providers WHERE id = ANY($1)",
    )
    .bind(&provider_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

    let task_rows: Vec<(i64, Task)> = sqlx::query_as::<_, TaskForRequest>(
        r#"
        SELECT brt.booking_request_id,
               t.id, t.service_provider_id, t.name, t.price, t.created_at, t.updated_at
        FROM booking_request_tasks brt
        JOIN tasks t ON t.id = brt.task_id
        WHERE brt.booking_request_id = ANY($1)
        ORDER BY brt.id
        "#,
    )
    .bind(&request_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| (row.booking_request_id, row.task))
    .collect();

    let mut tasks_by_request: HashMap<i64, Vec<Task>> = HashMap::new();
    for (request_id, task) in task_rows {
        tasks_by_request.entry(request_id).or_default().push(task);
    }

    let mut quotes_by_request: HashMap<i64, Quote> = sqlx::query_as::<_, Quote>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE booking_request_id = ANY($1)"
    ))
    .bind(&request_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|q| (q.booking_request_id, q))
    .collect();

    let data = requests
        .into_iter()
        .map(|request| {
            let provider = providers
                .get(&request.service_provider_id)
                .cloned()
                .ok_or_else(|| sqlx::Error::RowNotFound)?;
            let tasks = tasks_by_request.remove(&request.id).unwrap_or_default();
            let quote = quotes_by_request.remove(&request.id);
            Ok(BookingRequestDetail::assemble(request, provider, tasks, quote))
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

    Ok(Paginated::new(data, page, PER_PAGE, total))
}

#[derive(sqlx::FromRow)]
struct TaskForRequest {
    booking_request_id: i64,
    #[sqlx(flatten)]
    task: Task,
}

// ---- catalog reads ----

pub async fn find_customer(conn: &mut PgConnection, customer_id: i64) -> Result<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, created_at, updated_at FROM customers WHERE id = $1",
    )
    .bind(customer_id)
    .fetch_optional(conn)
    .await?;

    Ok(customer)
}

pub async fn list_service_providers(conn: &mut PgConnection) -> Result<Vec<ServiceProvider>> {
    let providers = sqlx::query_as::<_, ServiceProvider>(
        "SELECT id, business_name, created_at, updated_at FROM service_providers ORDER BY id",
    )
    .fetch_all(conn)
    .await?;

    Ok(providers)
}

pub async fn find_service_provider(
    conn: &mut PgConnection,
    service_provider_id: i64,
) -> Result<Option<ServiceProvider>> {
    let provider = sqlx::query_as::<_, ServiceProvider>(
        "SELECT id, business_name, created_at, updated_at FROM service_providers WHERE id = $1",
    )
    .bind(service_provider_id)
    .fetch_optional(conn)
    .await?;

    Ok(provider)
}

pub async fn tasks_for_provider(
    conn: &mut PgConnection,
    service_provider_id: i64,
) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE service_provider_id = $1 ORDER BY id"
    ))
    .bind(service_provider_id)
    .fetch_all(conn)
    .await?;

    Ok(tasks)
}

/// How many of the given task ids exist under this provider. Equal to the
/// id count means the whole payload is valid.
pub async fn count_tasks_of_provider(
    conn: &mut PgConnection,
    service_provider_id: i64,
    task_ids: &[i64],
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE service_provider_id = $1 AND id = ANY($2)",
    )
    .bind(service_provider_id)
    .bind(task_ids)
    .fetch_one(conn)
    .await?;

    Ok(count)
}
