// ABOUTME: Error types for function name resolution
// ABOUTME: Distinguishes malformed names from names that could not be found anywhere

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Malformed function name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    #[error("Failed to import '{name}' (attempted: {})", .attempts.join("; "))]
    ImportFailure {
        name: String,
        attempts: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
