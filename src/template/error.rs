// ABOUTME: Error types for text substitution strategies
// ABOUTME: Defines the failures a strict substitution can raise against the meta context

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Missing substitution key: {0}")]
    MissingKey(String),

    #[error("Invalid placeholder at offset {offset} in '{text}'")]
    InvalidPlaceholder { offset: usize, text: String },

    #[error("Malformed format string: {0}")]
    MalformedFormat(String),

    #[error("Handlebars error: {0}")]
    HandlebarsError(#[from] handlebars::RenderError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SubstitutionError>;
