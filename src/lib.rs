// ABOUTME: Main library module for the replacement YAML template engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod functions;
pub mod parser;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{ExecutionError, Meta, Output, ReplacementEngine, Scope, TemplateSource};
pub use functions::{FunctionRegistry, Host, Namespace, ShellHost, YamlModuleLoader};
pub use parser::{Block, Directive, TemplateDocument};
pub use template::{Strategy, Substituter};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
