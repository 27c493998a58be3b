// ABOUTME: Evaluation state threaded through block execution
// ABOUTME: Provides the shared meta context and the explicit path resolution scope

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::template::{self, DEFAULT_EOL, EOL_KEY};

/// The shared substitution context.
///
/// One instance lives for a whole top-level evaluation; nested templates
/// receive the same instance, so their `meta` blocks are visible afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    values: Mapping,
}

impl Meta {
    pub fn new() -> Self {
        Self::from_mapping(Mapping::new())
    }

    /// Wrap caller supplied values, seeding the line terminator if absent
    pub fn from_mapping(mut values: Mapping) -> Self {
        if !values.contains_key(EOL_KEY) {
            values.insert(Value::from(EOL_KEY), Value::from(DEFAULT_EOL));
        }
        Self { values }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut meta = Self::new();
        for (key, value) in pairs {
            meta.set(key, value);
        }
        meta
    }

    /// Set a value, replacing any existing one
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.values.insert(Value::String(key.into()), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The line terminator in effect
    pub fn eol(&self) -> &str {
        template::eol(&self.values)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.values
    }

    pub fn into_mapping(self) -> Mapping {
        self.values
    }

    /// Fold a `meta` block's mapping into the context.
    ///
    /// The block's values replace colliding entries; keys it lacks keep their
    /// current value.
    pub fn absorb(&mut self, incoming: Mapping) {
        for (key, value) in incoming {
            self.values.insert(key, value);
        }
    }

    /// YAML dump for diagnostics
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.values).unwrap_or_else(|e| format!("<unprintable meta: {}>", e))
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Mapping> for Meta {
    fn from(values: Mapping) -> Self {
        Self::from_mapping(values)
    }
}

/// Where relative paths resolve.
///
/// Evaluating a template file runs its blocks in a new scope rooted at the
/// file's directory; the enclosing scope is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    base_dir: PathBuf,
}

impl Scope {
    /// Scope resolving against the process working directory
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() || self.base_dir.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_seeds_eol() {
        let meta = Meta::new();
        assert_eq!(meta.eol(), "\n");

        let mut values = Mapping::new();
        values.insert(Value::from("eol"), Value::from("\r\n"));
        assert_eq!(Meta::from_mapping(values).eol(), "\r\n");
    }

    #[test]
    fn test_meta_absorb_replaces_collisions() {
        let mut meta = Meta::from_pairs([("a", 1), ("keep", 3)]);
        meta.absorb(serde_yaml::from_str("{a: 2, b: x, eol: \"\\r\\n\"}").unwrap());

        assert_eq!(meta.get("a"), Some(&Value::from(2)));
        assert_eq!(meta.get("b"), Some(&Value::from("x")));
        assert_eq!(meta.get("keep"), Some(&Value::from(3)));
        assert_eq!(meta.eol(), "\r\n");
        assert!(meta.to_yaml().contains("b: x"));
    }

    #[test]
    fn test_scope_resolution() {
        let scope = Scope::root();
        assert_eq!(scope.resolve("a.txt"), PathBuf::from("a.txt"));
        assert_eq!(scope.base_dir(), Path::new(""));

        let child = Scope::new("templates");
        assert_eq!(child.resolve("a.txt"), PathBuf::from("templates/a.txt"));
        assert_eq!(child.resolve("sub/b.txt"), PathBuf::from("templates/sub/b.txt"));
        assert_eq!(child.resolve("/abs/c.txt"), PathBuf::from("/abs/c.txt"));
    }
}
