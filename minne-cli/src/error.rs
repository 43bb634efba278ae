use std::io;
use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationErrors;

/// Unified error type for the harness.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Figment parsing error.
    #[error("configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),

    /// Configuration validation error.
    #[error("invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// I/O error on the REPL streams.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.field_errors() {
        let _ = writeln!(output, "Field '{}':", field);
        for error in errors.iter() {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => error.code.to_string(),
            };
            let _ = writeln!(output, "  - {}", message);
        }
    }
    output
}

impl From<ValidationErrors> for CliError {
    fn from(errors: ValidationErrors) -> Self {
        CliError::Validation(errors)
    }
}
