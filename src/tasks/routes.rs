//! Task routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the task router
///
/// # Routes
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks` - List the caller's tasks
/// - `GET /api/tasks/:task_id` - Fetch one task
/// - `PATCH /api/tasks/:task_id` - Partial update
/// - `DELETE /api/tasks/:task_id` - Delete a task
pub fn tasks_routes() -> Router {
    Router::new()
        .route(
            "/api/tasks",
            post(handlers::create_task).get(handlers::list_tasks),
        )
        .route(
            "/api/tasks/:task_id",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
}
