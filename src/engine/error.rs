// ABOUTME: Error types for template evaluation and block dispatch
// ABOUTME: Wraps every module's failures and records which block failed

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Substitution error: {0}")]
    SubstitutionError(#[from] crate::template::SubstitutionError),

    #[error("Value error: {0}")]
    ValueError(#[from] crate::value::ValueError),

    #[error("Parser error: {0}")]
    ParserError(#[from] crate::parser::ParserError),

    #[error("Resolve error: {0}")]
    ResolveError(#[from] crate::functions::ResolveError),

    #[error("'{directive}' blocks need a host; none is enabled")]
    HostDisabled { directive: String },

    #[error("Host failed in '{directive}' block: {message}")]
    HostFailure { directive: String, message: String },

    #[error("Function '{name}' failed: {message}")]
    FunctionFailed { name: String, message: String },

    #[error("Failed to read '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Block {index} failed: {source}")]
    BlockFailed {
        index: usize,
        #[source]
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// The underlying failure, beneath any block wrappers
    pub fn root(&self) -> &ExecutionError {
        match self {
            ExecutionError::BlockFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Index of the failing block, when known
    pub fn block_index(&self) -> Option<usize> {
        match self {
            ExecutionError::BlockFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
