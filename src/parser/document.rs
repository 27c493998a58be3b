// ABOUTME: Template document loading from files, YAML text or already-parsed values
// ABOUTME: Extracts the ordered block list and remembers where the document came from

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::block::Block;
use super::error::{ParserError, Result};

/// Document field holding the block list.
pub const BLOCK_LIST_KEY: &str = "replacement";

/// A template: an ordered list of raw blocks.
///
/// Blocks stay unparsed until dispatch because `prep` may rewrite their
/// fields against the meta context of the moment.
#[derive(Debug, Clone, Default)]
pub struct TemplateDocument {
    pub blocks: Vec<Value>,
    /// File the document was read from; relative paths resolve against its directory.
    pub path: Option<PathBuf>,
}

impl TemplateDocument {
    /// Parse a template document from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParserError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        let mut document = Self::from_yaml(&content)?;
        document.path = Some(path.to_path_buf());

        debug!(
            "Loaded template '{}' with {} blocks",
            path.display(),
            document.blocks.len()
        );
        Ok(document)
    }

    /// Parse a template document from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(value)
    }

    /// Build a document from a structured value.
    ///
    /// A mapping must carry the block list under [`BLOCK_LIST_KEY`]; a bare
    /// sequence is taken as the block list itself.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Mapping(mut map) => match map.remove(BLOCK_LIST_KEY) {
                Some(Value::Sequence(blocks)) => Ok(Self::from_blocks(blocks)),
                Some(Value::Null) => Ok(Self::default()),
                Some(_) => Err(ParserError::InvalidBlock(format!(
                    "'{}' must be a list of blocks",
                    BLOCK_LIST_KEY
                ))),
                None => Err(ParserError::NoReplacementKey {
                    key: BLOCK_LIST_KEY.to_string(),
                }),
            },
            Value::Sequence(blocks) => Ok(Self::from_blocks(blocks)),
            _ => Err(ParserError::NoReplacementKey {
                key: BLOCK_LIST_KEY.to_string(),
            }),
        }
    }

    pub fn from_blocks(blocks: Vec<Value>) -> Self {
        Self { blocks, path: None }
    }

    /// Directory relative paths inside this document resolve against
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parse every block without evaluating anything.
    ///
    /// Blocks are parsed as written, so a block whose directive only appears
    /// after `prep` substitution is reported as invalid here.
    pub fn check(&self) -> Result<Vec<Block>> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, value)| {
                Block::from_value(value).map_err(|e| {
                    ParserError::InvalidBlock(format!("block {}: {}", index, e))
                })
            })
            .collect()
    }
}

impl From<Vec<Value>> for TemplateDocument {
    fn from(blocks: Vec<Value>) -> Self {
        Self::from_blocks(blocks)
    }
}

impl TryFrom<Mapping> for TemplateDocument {
    type Error = ParserError;

    fn try_from(map: Mapping) -> Result<Self> {
        Self::from_value(Value::Mapping(map))
    }
}
