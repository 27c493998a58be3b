// ABOUTME: Block execution engine for replacement templates
// ABOUTME: Handles directive dispatch, template evaluation and the shared evaluation context

pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod result;

pub use context::{Meta, Scope};
pub use dispatch::Acquired;
pub use error::{ExecutionError, Result};
pub use executor::{ReplacementEngine, TemplateSource};
pub use result::Output;
