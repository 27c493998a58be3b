// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temporary template directories and a builder for template documents

#![allow(dead_code)]

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a template document one block at a time.
#[derive(Default)]
pub struct TemplateBuilder {
    blocks: Vec<Value>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block given as YAML (flow or block style)
    pub fn block(mut self, yaml: &str) -> Self {
        self.blocks
            .push(serde_yaml::from_str(yaml).expect("Invalid block YAML"));
        self
    }

    pub fn text(self, input: &str) -> Self {
        self.with_fields(&[("text", "text"), ("input", input)])
    }

    pub fn text_file(self, path: &str) -> Self {
        self.with_fields(&[("text", "file"), ("input", path)])
    }

    pub fn nested_template(self, path: &str) -> Self {
        self.with_fields(&[("text", "replacement"), ("input", path)])
    }

    fn with_fields(mut self, fields: &[(&str, &str)]) -> Self {
        let mut block = Mapping::new();
        for (key, value) in fields {
            block.insert(Value::from(*key), Value::from(*value));
        }
        self.blocks.push(Value::Mapping(block));
        self
    }

    pub fn blocks(&self) -> Vec<Value> {
        self.blocks.clone()
    }

    pub fn to_yaml(&self) -> String {
        let mut document = Mapping::new();
        document.insert(
            Value::from("replacement"),
            Value::Sequence(self.blocks.clone()),
        );
        serde_yaml::to_string(&document).expect("Failed to serialize template")
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` (which may contain subdirectories)
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn write_template(&self, name: &str, builder: &TemplateBuilder) -> PathBuf {
        self.write_file(name, &builder.to_yaml())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
