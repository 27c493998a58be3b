// ABOUTME: Coercion between scalars, structured mappings, line lists and serialized text
// ABOUTME: Renders values to terminated text and lazily parses text back into mappings

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::error::{Result, ValueError};
use super::merge::describe;
use crate::template::display;

/// Serialization used when a mapping has to become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }
}

/// Render `value` as text ending in exactly one `eol`.
///
/// Mappings become a YAML document with explicit start and end markers (or a
/// single line of JSON), sequences become one line per element and scalars
/// their canonical text with trailing whitespace removed.
pub fn stringify(value: &Value, format: Format, eol: &str) -> Result<String> {
    match value {
        Value::Mapping(_) => match format {
            Format::Json => Ok(format!("{}{}", serde_json::to_string(value)?, eol)),
            Format::Yaml => {
                let document = format!("---\n{}...\n", serde_yaml::to_string(value)?);
                Ok(if eol == "\n" {
                    document
                } else {
                    document.replace('\n', eol)
                })
            }
        },
        Value::Sequence(lines) => lines
            .iter()
            .map(|line| stringify(line, format, eol))
            .collect(),
        Value::Tagged(_) => {
            let yaml = serde_yaml::to_string(value)?;
            Ok(format!("{}{}", yaml.trim_end(), eol))
        }
        scalar => Ok(format!("{}{}", display(scalar).trim_end(), eol)),
    }
}

/// Parse YAML (or JSON) text that must hold a mapping
pub fn parse_mapping(text: &str) -> Result<Mapping> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(other) => Err(ValueError::MalformedStructure(format!(
            "expected a mapping, found {}",
            describe(&other)
        ))),
        Err(e) => Err(ValueError::MalformedStructure(e.to_string())),
    }
}

/// Coerce an acquired value into a mapping.
///
/// With `key`, the value is always stringified and wrapped as `{key: text}`.
/// Otherwise mappings pass through and anything else is stringified and
/// parsed; content that does not parse to a mapping yields an empty mapping.
pub fn structure(value: Value, key: Option<&str>, format: Format, eol: &str) -> Result<Mapping> {
    if let Some(key) = key {
        let mut wrapped = Mapping::new();
        wrapped.insert(
            Value::String(key.to_string()),
            Value::String(stringify(&value, format, eol)?),
        );
        return Ok(wrapped);
    }

    let text = match value {
        Value::Mapping(map) => return Ok(map),
        Value::String(text) => text,
        other => stringify(&other, format, eol)?,
    };

    match parse_mapping(&text) {
        Ok(map) => Ok(map),
        Err(e) => {
            debug!("Discarding unstructured content: {}", e);
            Ok(Mapping::new())
        }
    }
}
