//! # Command Error Handling
//!
//! Error handling utilities for stackctl commands, using the handled crate
//! for consistent error property extraction.

use handled::Handle;

use crate::RecordIdParseError;

/// User-friendly error information extracted from various error types.
#[derive(Debug, Clone)]
pub struct UserError {
    /// The main error message to display.
    pub message: String,
    /// Optional usage hint to help the user correct the error.
    pub usage_hint: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Handle<UserError> for UserError {
    fn handle(&self) -> Option<UserError> {
        Some(self.clone())
    }
}

impl Handle<UserError> for RecordIdParseError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("{}", self),
            usage_hint: Some(
                "Record ids are the 24 hex characters shown in a record's URL".to_string(),
            ),
        })
    }
}

/// Formats an error for CLI output, attaching the usage hint when one can be
/// extracted.
pub fn format_cli_error<E>(error: &E) -> String
where
    E: Handle<UserError> + std::fmt::Display,
{
    if let Some(user_error) = error.handle() {
        let mut output = format!("Error: {}", user_error.message);
        if let Some(hint) = user_error.usage_hint {
            output.push_str(&format!("\nHint: {}", hint));
        }
        output
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_errors_carry_a_hint() {
        let err = "xyz".parse::<crate::RecordId>().unwrap_err();
        let user_error = err.handle().unwrap();
        assert!(user_error.usage_hint.is_some());
        let formatted = format_cli_error(&err);
        assert!(formatted.contains("Hint:"));
    }
}
