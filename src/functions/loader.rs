// ABOUTME: Loading of external module files as isolated function namespaces
// ABOUTME: Backs the "symbol path" form of function names

use anyhow::{bail, Context};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

use super::{function, Namespace};

/// Loads a module file into a fresh namespace.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> anyhow::Result<Namespace>;

    fn loader_type(&self) -> &'static str;
}

/// Loads YAML data files as modules.
///
/// Nested mappings become child namespaces and every other entry becomes a
/// function returning that entry's value, whatever its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlModuleLoader;

impl YamlModuleLoader {
    fn namespace(map: Mapping) -> Namespace {
        let mut namespace = Namespace::new();
        for (key, value) in map {
            let Some(name) = key.as_str().map(str::to_string) else {
                debug!("Skipping non-string module key {:?}", key);
                continue;
            };
            match value {
                Value::Mapping(child) => namespace.insert_namespace(&name, Self::namespace(child)),
                leaf => namespace.insert_function(&name, function(move |_| Ok(leaf.clone()))),
            }
        }
        namespace
    }
}

impl ModuleLoader for YamlModuleLoader {
    fn load(&self, path: &Path) -> anyhow::Result<Namespace> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read module '{}'", path.display()))?;

        match serde_yaml::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse module '{}'", path.display()))?
        {
            Value::Mapping(map) => Ok(Self::namespace(map)),
            _ => bail!("Module '{}' is not a mapping", path.display()),
        }
    }

    fn loader_type(&self) -> &'static str {
        "yaml"
    }
}
