// ABOUTME: Error types for merging and coercing heterogeneous values
// ABOUTME: Defines merge failures and structured-data parse/serialize failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Cannot merge value of type '{0}'")]
    UnmergeableType(String),

    #[error("Malformed structured data: {0}")]
    MalformedStructure(String),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValueError>;
