// src/tasks/validators.rs

use super::models::{CreateTaskRequest, UpdateTaskRequest};
use crate::common::{ValidationResult, Validator};

const MAX_TITLE_LENGTH: usize = 500;

// ============================================================================
// Task Validators
// ============================================================================

pub struct TaskValidator;

impl Validator<CreateTaskRequest> for TaskValidator {
    fn validate(&self, data: &CreateTaskRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_title(&mut result, &data.title);
        result
    }
}

impl Validator<UpdateTaskRequest> for TaskValidator {
    fn validate(&self, data: &UpdateTaskRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Partial update: only a title that is actually present gets checked
        if let Some(title) = &data.title {
            validate_title(&mut result, title);
        }

        result
    }
}

fn validate_title(result: &mut ValidationResult, title: &str) {
    // Whitespace-only counts as empty
    if title.trim().is_empty() {
        result.add_error("title", "Title is required");
    } else if title.len() > MAX_TITLE_LENGTH {
        result.add_error("title", "Title must be less than 500 characters");
    }
}
