// ABOUTME: Block outputs and the accumulators block lists fold them into
// ABOUTME: Defines text-append and deep-merge accumulation plus final text coercion

use serde_yaml::{Mapping, Value};

use crate::parser::Accumulate;
use crate::value::{self, Format, Result};

/// Output of a block, or the accumulated output of a block list.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Data(Value),
}

impl Output {
    /// Empty accumulator for a block list
    pub fn empty(accumulate: Accumulate) -> Self {
        match accumulate {
            Accumulate::Text => Output::Text(String::new()),
            Accumulate::Data => Output::Data(Value::Mapping(Mapping::new())),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Output::Text(text) => text.is_empty(),
            Output::Data(Value::Mapping(map)) => map.is_empty(),
            Output::Data(Value::Sequence(seq)) => seq.is_empty(),
            Output::Data(Value::Null) => true,
            Output::Data(_) => false,
        }
    }

    /// Fold a block's output into this accumulator.
    ///
    /// Text appends, stringifying data first. Data deep-merges, parsing
    /// text into a mapping first.
    pub fn absorb(&mut self, other: Output, eol: &str) -> Result<()> {
        match (self, other) {
            (Output::Text(text), Output::Text(more)) => text.push_str(&more),
            (Output::Text(text), Output::Data(data)) => {
                text.push_str(&value::stringify(&data, Format::Yaml, eol)?)
            }
            (Output::Data(data), Output::Data(more)) => value::merge(data, more)?,
            (Output::Data(data), Output::Text(more)) => {
                let parsed = value::structure(Value::String(more), None, Format::Yaml, eol)?;
                value::merge(data, Value::Mapping(parsed))?
            }
        }
        Ok(())
    }

    /// Final text form of the output
    pub fn into_text(self, format: Format, eol: &str) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        match self {
            Output::Text(text) => Ok(text),
            Output::Data(data) => value::stringify(&data, format, eol),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            Output::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Output::Data(data) => Some(data),
            Output::Text(_) => None,
        }
    }
}
