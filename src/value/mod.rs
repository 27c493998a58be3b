// ABOUTME: Value module for merging and coercing heterogeneous template data
// ABOUTME: Exports the deep merge algorithm and text/structure coercions

pub mod coerce;
pub mod error;
pub mod merge;

pub use coerce::{parse_mapping, stringify, structure, Format};
pub use error::{Result, ValueError};
pub use merge::{classify, describe, merge, merged, Shape};
