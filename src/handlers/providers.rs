use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

use crate::errors::AppError;
use crate::models::{ServiceProvider, Task};
use crate::repository;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_providers))
        .route("/:provider_id/tasks", get(list_provider_tasks))
}

/// GET /api/service-providers
async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceProvider>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let providers = repository::list_service_providers(&mut conn).await?;
    Ok(Json(providers))
}

/// GET /api/service-providers/:provider_id/tasks
async fn list_provider_tasks(
    State(state): State<AppState>,
    Path(provider_id): Path<i64>,
) -> Result<Json<Vec<Task>>, AppError> {
    let mut conn = state.db.acquire().await?;

    repository::find_service_provider(&mut conn, provider_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Service provider not found.".to_string()))?;

    let tasks = repository::tasks_for_provider(&mut conn, provider_id).await?;
    Ok(Json(tasks))
}
