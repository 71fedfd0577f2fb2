// src/auth/validators.rs

use super::models::RegisterRequest;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Registration Validators
// ============================================================================

pub struct RegisterValidator;

impl Validator<RegisterRequest> for RegisterValidator {
    fn validate(&self, data: &RegisterRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.name.trim().len() < 2 {
            result.add_error("name", "Name must be at least 2 characters");
        }

        if !is_valid_email(&data.email) {
            result.add_error("email", "Please enter a valid email address");
        }

        if data.password.len() < 8 {
            result.add_error("password", "Password must be at least 8 characters");
        }

        result
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Basic structural email check: one '@' with non-empty local part and a
/// dotted domain. Deliverability is the mail server's problem.
fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || domain.is_empty() {
        return false;
    }

    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
