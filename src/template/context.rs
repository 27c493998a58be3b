// ABOUTME: Read access to the meta context used by every substitution strategy
// ABOUTME: Provides key lookup, line terminator discovery and canonical value rendering

use serde_yaml::{Mapping, Value};

use super::error::{Result, SubstitutionError};

/// Meta key holding the line terminator.
pub const EOL_KEY: &str = "eol";

/// Line terminator used when the context does not configure one.
pub const DEFAULT_EOL: &str = "\n";

/// Line terminator configured in `context`, falling back to [`DEFAULT_EOL`].
pub fn eol(context: &Mapping) -> &str {
    context
        .get(EOL_KEY)
        .and_then(Value::as_str)
        .filter(|eol| !eol.is_empty())
        .unwrap_or(DEFAULT_EOL)
}

/// Look up a top-level name in the context
pub fn lookup<'a>(context: &'a Mapping, name: &str) -> Option<&'a Value> {
    context.get(name)
}

/// Render a value the way it appears when substituted into text.
///
/// Strings are inserted verbatim, `null` as nothing, other scalars in their
/// canonical YAML form and collections as flow JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => display(&tagged.value),
        collection => serde_json::to_string(collection).unwrap_or_else(|_| {
            serde_yaml::to_string(collection)
                .map(|yaml| yaml.trim_end().to_string())
                .unwrap_or_default()
        }),
    }
}

/// Convert context to JSON for handlebars rendering
pub fn to_json(context: &Mapping) -> Result<serde_json::Value> {
    serde_json::to_value(context).map_err(SubstitutionError::JsonError)
}
