// Helper functions for safe logging

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() == 2 && !parts[1].is_empty() {
        // First char by boundary, not by byte; the local part may be multibyte
        if let Some(first) = parts[0].chars().next() {
            return format!("{}***@{}", first, parts[1]);
        }
    }
    "***@***.***".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("ann@x.com"), "a***@x.com");
    }

    #[test]
    fn test_safe_email_log_handles_multibyte_local_part() {
        assert_eq!(safe_email_log("über@x.com"), "ü***@x.com");
        assert_eq!(safe_email_log("日本@x.com"), "日***@x.com");
    }

    #[test]
    fn test_safe_email_log_rejects_malformed() {
        assert_eq!(safe_email_log("no-at-sign"), "***@***.***");
        assert_eq!(safe_email_log("a"), "***@***.***");
        assert_eq!(safe_email_log("@x.com"), "***@***.***");
        assert_eq!(safe_email_log("ann@"), "***@***.***");
    }
}
