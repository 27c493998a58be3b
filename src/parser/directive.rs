// ABOUTME: Closed dispatch table of (yield, source) directive pairs
// ABOUTME: Selects the single legal directive of a block based on its input kind

use serde_yaml::Mapping;

use super::error::{ParserError, Result};

/// Declared output shape of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Yield {
    Text,
    Dict,
    Meta,
}

impl Yield {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "text" => Some(Yield::Text),
            "dict" => Some(Yield::Dict),
            "meta" => Some(Yield::Meta),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Yield::Text => "text",
            Yield::Dict => "dict",
            Yield::Meta => "meta",
        }
    }

    /// Accumulator a nested template evaluated for this yield should use
    pub fn accumulate(&self) -> Accumulate {
        match self {
            Yield::Text => Accumulate::Text,
            Yield::Dict | Yield::Meta => Accumulate::Data,
        }
    }
}

/// How a block list combines the outputs of its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulate {
    /// Append text
    Text,
    /// Deep-merge structured data
    Data,
}

/// Runtime type of a block's `input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Scalar,
    Data,
    Blocks,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Scalar => "scalar",
            InputKind::Data => "mapping",
            InputKind::Blocks => "block list",
        }
    }
}

/// Acquisition strategy named by a yield key's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Literal text
    Text,
    /// Structured data, substituted with `prep`
    Dict,
    /// Contents of a file relative to the current template
    File,
    /// Host expression evaluation
    Eval,
    /// Host code execution
    Exec,
    /// Call of a resolved function with `args`
    Func,
    /// Another template document, evaluated recursively
    Replacement,
    /// Inline list of blocks, evaluated recursively
    Nested(Accumulate),
}

impl Source {
    /// Parse a source name; `None` if it is not legal for `kind`.
    pub fn parse(name: &str, kind: InputKind) -> Option<Self> {
        match (kind, name) {
            (InputKind::Blocks, "text") => Some(Source::Nested(Accumulate::Text)),
            (InputKind::Blocks, "dict") => Some(Source::Nested(Accumulate::Data)),
            (InputKind::Blocks, _) => None,
            (_, "text") => Some(Source::Text),
            (_, "dict") => Some(Source::Dict),
            (InputKind::Data, _) => None,
            (InputKind::Scalar, "file") => Some(Source::File),
            (InputKind::Scalar, "eval") => Some(Source::Eval),
            (InputKind::Scalar, "exec") => Some(Source::Exec),
            (InputKind::Scalar, "func") => Some(Source::Func),
            (InputKind::Scalar, "replacement") => Some(Source::Replacement),
            (InputKind::Scalar, _) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Text | Source::Nested(Accumulate::Text) => "text",
            Source::Dict | Source::Nested(Accumulate::Data) => "dict",
            Source::File => "file",
            Source::Eval => "eval",
            Source::Exec => "exec",
            Source::Func => "func",
            Source::Replacement => "replacement",
        }
    }
}

/// The (yield, source) pair a block executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub yield_kind: Yield,
    pub source: Source,
}

impl Directive {
    /// Find the single directive among a block's fields.
    ///
    /// Zero or several legal pairings are both an error; ambiguity is never
    /// resolved by field order.
    pub fn find(fields: &Mapping, kind: InputKind) -> Result<Self> {
        let mut found = Vec::new();
        let mut candidates = Vec::new();

        for (key, value) in fields {
            let Some(yield_kind) = key.as_str().and_then(Yield::from_key) else {
                continue;
            };
            let Some(name) = value.as_str() else {
                candidates.push(format!("{}: <{}>", yield_kind.as_str(), crate::value::describe(value)));
                continue;
            };

            candidates.push(format!("{}: {}", yield_kind.as_str(), name));
            if let Some(source) = Source::parse(name, kind) {
                found.push(Directive { yield_kind, source });
            }
        }

        match found.as_slice() {
            [directive] => Ok(*directive),
            _ => Err(ParserError::NoValidDirective {
                valid: found.len(),
                candidates,
            }),
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.yield_kind.as_str(), self.source.as_str())
    }
}
