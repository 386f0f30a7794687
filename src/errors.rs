use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Integrity backstop: the unique (booking_request_id, task_id)
    /// constraint fired even though the creation transaction holds the
    /// per-customer lock. Surfaced as a 5xx, never retried.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// One or more requested tasks already sit in another pending booking
    /// request of the same customer. `task_names[i]` names `task_ids[i]`.
    #[error("Cannot add tasks that already exist in other pending booking requests")]
    DuplicateTasks {
        task_ids: Vec<i64>,
        task_names: Vec<String>,
    },

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Database error occurred" }),
                )
            }
            AppError::ConstraintViolation(msg) => {
                tracing::error!("Constraint violation: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal integrity error" }),
                )
            }
            AppError::DuplicateTasks {
                task_ids,
                task_names,
            } => {
                let mut body = json!({
                    "message": self.to_string(),
                    "duplicate_task_ids": task_ids,
                });
                if !task_names.is_empty() {
                    body["duplicate_task_names"] = json!(task_names);
                }
                (StatusCode::CONFLICT, body)
            }
            AppError::InvalidTransition(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": msg }))
            }
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": msg }))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
