// ABOUTME: Error types for template document loading and block parsing
// ABOUTME: Defines the configuration errors a malformed document or block raises

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to read template file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Template document has no '{key}' block list")]
    NoReplacementKey { key: String },

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Block has no 'input'")]
    MissingInput,

    #[error(
        "Expected exactly one valid yield directive, found {valid} (yield keys: [{}])",
        .candidates.join(", ")
    )]
    NoValidDirective {
        valid: usize,
        candidates: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;
