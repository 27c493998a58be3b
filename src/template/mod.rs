// ABOUTME: Substitution module for the replacement template engine
// ABOUTME: Provides named text substitution strategies evaluated against the meta context

pub mod context;
pub mod error;
pub mod strategy;
pub mod substituter;

pub use context::{display, eol, DEFAULT_EOL, EOL_KEY};
pub use error::{Result, SubstitutionError};
pub use strategy::Strategy;
pub use substituter::Substituter;
