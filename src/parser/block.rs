// ABOUTME: Block structure parsed from one entry of a template's block list
// ABOUTME: Resolves the input kind, directive, strategies, key, args and options of a block

use serde_yaml::{Mapping, Value};

use super::directive::{Directive, InputKind};
use super::error::{ParserError, Result};
use crate::template::{display, Strategy};
use crate::value::{describe, Format};

pub const INPUT_KEY: &str = "input";
pub const PREP_KEY: &str = "prep";
pub const PROC_KEY: &str = "proc";
pub const KEY_KEY: &str = "key";
pub const ARGS_KEY: &str = "args";
pub const OPTIONS_KEY: &str = "options";

/// A block's `input`, classified by runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Scalar(String),
    Data(Mapping),
    Blocks(Vec<Value>),
}

impl Input {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Err(ParserError::MissingInput),
            Value::String(text) => Ok(Input::Scalar(text.clone())),
            Value::Bool(_) | Value::Number(_) => Ok(Input::Scalar(display(value))),
            Value::Mapping(map) => Ok(Input::Data(map.clone())),
            Value::Sequence(blocks) => Ok(Input::Blocks(blocks.clone())),
            Value::Tagged(_) => Err(ParserError::InvalidBlock(format!(
                "'{}' cannot be a {}",
                INPUT_KEY,
                describe(value)
            ))),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Input::Scalar(_) => InputKind::Scalar,
            Input::Data(_) => InputKind::Data,
            Input::Blocks(_) => InputKind::Blocks,
        }
    }
}

/// Per-block flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub json: bool,
}

impl Options {
    /// Accepts a list of flag names, a single flag name, or a mapping of
    /// flag names to booleans.
    fn from_value(value: Option<&Value>) -> Self {
        let json = match value {
            Some(Value::Sequence(flags)) => flags.iter().any(|flag| flag.as_str() == Some("json")),
            Some(Value::String(flags)) => flags
                .split(|c: char| c == ',' || c.is_whitespace())
                .any(|flag| flag == "json"),
            Some(Value::Mapping(flags)) => flags
                .get("json")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            _ => false,
        };
        Options { json }
    }

    pub fn format(&self) -> Format {
        if self.json {
            Format::Json
        } else {
            Format::Yaml
        }
    }
}

/// One parsed block, ready to dispatch.
#[derive(Debug, Clone)]
pub struct Block {
    pub directive: Directive,
    pub input: Input,
    pub prep: Strategy,
    pub proc: Strategy,
    pub key: Option<String>,
    pub args: Mapping,
    pub options: Options,
}

impl Block {
    /// Read a strategy name without parsing the rest of the block
    pub fn strategy(fields: &Mapping, role: &str) -> Strategy {
        Strategy::from_name(fields.get(role).and_then(Value::as_str))
    }

    pub fn parse(fields: &Mapping) -> Result<Self> {
        let input = fields
            .get(INPUT_KEY)
            .ok_or(ParserError::MissingInput)
            .and_then(Input::from_value)?;

        let directive = Directive::find(fields, input.kind())?;

        let key = match fields.get(KEY_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(_)) | Some(Value::Sequence(_)) | Some(Value::Tagged(_)) => {
                return Err(ParserError::InvalidBlock(format!(
                    "'{}' must be a scalar",
                    KEY_KEY
                )));
            }
            Some(scalar) => Some(display(scalar)),
        };

        let args = match fields.get(ARGS_KEY) {
            None | Some(Value::Null) => Mapping::new(),
            Some(Value::Mapping(args)) => args.clone(),
            Some(other) => {
                return Err(ParserError::InvalidBlock(format!(
                    "'{}' must be a mapping, found {}",
                    ARGS_KEY,
                    describe(other)
                )));
            }
        };

        Ok(Block {
            directive,
            input,
            prep: Self::strategy(fields, PREP_KEY),
            proc: Self::strategy(fields, PROC_KEY),
            key,
            args,
            options: Options::from_value(fields.get(OPTIONS_KEY)),
        })
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Mapping(fields) => Self::parse(fields),
            other => Err(ParserError::InvalidBlock(format!(
                "expected a mapping, found {}",
                describe(other)
            ))),
        }
    }
}
