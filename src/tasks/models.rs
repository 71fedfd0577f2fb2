//! Task data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Task database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Create task request body
#[derive(Deserialize, Debug)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// Partial update request body
///
/// An absent field leaves the stored value untouched.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Delete response body
#[derive(Serialize, Debug)]
pub struct DeleteTaskResponse {
    pub success: bool,
}
