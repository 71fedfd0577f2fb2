//! Task CRUD handlers
//!
//! Ownership is enforced on every operation by scoping queries to the
//! caller's user id. A task that exists but belongs to someone else is
//! reported as NotFound, indistinguishable from true absence, so callers
//! cannot probe for other users' records.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::{CreateTaskRequest, DeleteTaskResponse, Task, UpdateTaskRequest};
use super::validators::TaskValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_task_id, ApiError, AppState, Validator};

/// POST /api/tasks
/// Creates a task owned by the authenticated user
///
/// # Response
/// 201 with the persisted Task; 400 if the title trims to empty.
pub async fn create_task(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = TaskValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let id = generate_task_id();
    let title = payload.title.trim().to_string();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, user_id, title, completed, created_at, updated_at)
        VALUES (?, ?, ?, 0, datetime('now'), datetime('now'))
        "#,
    )
    .bind(&id)
    .bind(&authed.id)
    .bind(&title)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let task = fetch_owned_task(&state, &id, &authed.id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("task not persisted".to_string()))?;

    info!(user_id = %authed.id, task_id = %id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks
/// Lists all tasks owned by the authenticated user, newest first
///
/// An empty list is a valid 200 response.
pub async fn list_tasks(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    let state = state_lock.read().await.clone();

    // rowid breaks creation-time ties in insertion order
    let tasks: Vec<Task> = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, title, completed, created_at, updated_at
        FROM tasks
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(tasks))
}

/// GET /api/tasks/:task_id
/// Fetches a single task owned by the authenticated user
pub async fn get_task(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let state = state_lock.read().await.clone();

    let task = fetch_owned_task(&state, &task_id, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// PATCH /api/tasks/:task_id
/// Applies a partial update to a task owned by the authenticated user
///
/// Only fields present in the request are written; an absent field leaves
/// the stored value untouched. Bumps updated_at.
pub async fn update_task(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(task_id): Path<String>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation = TaskValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let task = fetch_owned_task(&state, &task_id, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let title = payload
        .title
        .as_deref()
        .map(|t| t.trim().to_string())
        .unwrap_or(task.title);
    let completed = payload.completed.unwrap_or(task.completed);

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?, completed = ?, updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&title)
    .bind(completed)
    .bind(&task_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let updated = fetch_owned_task(&state, &task_id, &authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    info!(user_id = %authed.id, task_id = %task_id, "Task updated");

    Ok(Json(updated))
}

/// DELETE /api/tasks/:task_id
/// Permanently removes a task owned by the authenticated user
///
/// A second delete of the same id reports NotFound since the record is gone.
pub async fn delete_task(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(task_id): Path<String>,
) -> Result<Json<DeleteTaskResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(&task_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(user_id = %authed.id, task_id = %task_id, "Task deleted");

    Ok(Json(DeleteTaskResponse { success: true }))
}

// ---- Helper Functions ----

/// Lookup scoped to the owner; None covers both absence and foreign ownership
async fn fetch_owned_task(
    state: &AppState,
    task_id: &str,
    user_id: &str,
) -> Result<Option<Task>, ApiError> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, user_id, title, completed, created_at, updated_at
        FROM tasks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)
}
