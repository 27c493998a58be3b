// ABOUTME: Parser module for YAML template documents and their blocks
// ABOUTME: Exports document loading, block parsing and the directive dispatch table

pub mod block;
pub mod directive;
pub mod document;
pub mod error;

pub use block::{Block, Input, Options};
pub use directive::{Accumulate, Directive, InputKind, Source, Yield};
pub use document::{TemplateDocument, BLOCK_LIST_KEY};
pub use error::{ParserError, Result};
