// ABOUTME: Callable functions available to `func` blocks and the host evaluation capability
// ABOUTME: Defines function namespaces, the resolving registry, module loaders and hosts

pub mod error;
pub mod host;
pub mod loader;
pub mod registry;

pub use error::ResolveError;
pub use host::{Host, ShellHost};
pub use loader::{ModuleLoader, YamlModuleLoader};
pub use registry::FunctionRegistry;

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::sync::Arc;

/// A callable taking a block's keyword arguments.
pub type Function = Arc<dyn Fn(&Mapping) -> anyhow::Result<Value> + Send + Sync>;

/// Wrap a closure as a [`Function`]
pub fn function<F>(f: F) -> Function
where
    F: Fn(&Mapping) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A tree of named functions, addressed by dotted attribute paths.
#[derive(Clone, Default)]
pub struct Namespace {
    functions: IndexMap<String, Function>,
    children: IndexMap<String, Namespace>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Mapping) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_function(name, function(f));
        self
    }

    pub fn with_namespace(mut self, name: &str, namespace: Namespace) -> Self {
        self.insert_namespace(name, namespace);
        self
    }

    pub fn insert_function(&mut self, name: &str, f: Function) {
        self.functions.insert(name.to_string(), f);
    }

    pub fn insert_namespace(&mut self, name: &str, namespace: Namespace) {
        self.children.insert(name.to_string(), namespace);
    }

    /// Walk `path` through child namespaces to a function
    pub fn lookup(&self, path: &[&str]) -> Option<Function> {
        match path {
            [] => None,
            [name] => self.functions.get(*name).cloned(),
            [head, rest @ ..] => self.children.get(*head)?.lookup(rest),
        }
    }

    /// Dotted paths of every function in this namespace, depth first
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        for (child_name, child) in &self.children {
            names.extend(
                child
                    .function_names()
                    .into_iter()
                    .map(|name| format!("{}.{}", child_name, name)),
            );
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.children.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}
