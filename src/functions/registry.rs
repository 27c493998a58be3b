// ABOUTME: Registry resolving function names used by `func` blocks
// ABOUTME: Supports global names, dotted module paths and the "symbol path" module file form

use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, error};

use super::error::{ResolveError, Result};
use super::loader::ModuleLoader;
use super::{function, Function, Namespace};
use serde_yaml::{Mapping, Value};

pub struct FunctionRegistry {
    globals: IndexMap<String, Function>,
    modules: IndexMap<String, Namespace>,
    loader: Option<Box<dyn ModuleLoader>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            globals: IndexMap::new(),
            modules: IndexMap::new(),
            loader: None,
        }
    }

    /// Register a global function, matched only by its exact full name
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Mapping) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.globals.insert(name.to_string(), function(f));
    }

    /// Register a module under a (possibly dotted) module path
    pub fn register_module(&mut self, path: &str, namespace: Namespace) {
        self.modules.insert(path.to_string(), namespace);
    }

    pub fn set_loader(&mut self, loader: Box<dyn ModuleLoader>) {
        self.loader = Some(loader);
    }

    /// Resolve `name` to a function.
    ///
    /// `name` is either a dotted path (`module.sub.Class.func`), tried from
    /// the longest module prefix to the shortest, or `"symbol path"` naming a
    /// module file relative to `base_dir` and a dotted symbol inside it.
    /// Every failed attempt is logged before `ImportFailure` is returned.
    pub fn resolve(&self, name: &str, base_dir: &Path) -> Result<Function> {
        let name = name.trim();
        if let Some(found) = self.globals.get(name) {
            return Ok(found.clone());
        }

        let tokens: Vec<&str> = name.split_whitespace().collect();
        let mut attempts = vec![format!("global '{}'", name)];

        let found = match tokens.as_slice() {
            [dotted] => self.resolve_dotted(dotted, &mut attempts)?,
            [symbol, path] => self.resolve_file(symbol, path, base_dir, &mut attempts)?,
            [] => return Err(malformed(name, "empty name")),
            _ => return Err(malformed(name, "expected 'dotted.name' or 'symbol path'")),
        };

        if let Some(found) = found {
            return Ok(found);
        }

        error!("Failed to import '{}'", name);
        for attempt in &attempts {
            error!("  attempted {}", attempt);
        }

        Err(ResolveError::ImportFailure {
            name: name.to_string(),
            attempts,
        })
    }

    fn resolve_dotted(&self, name: &str, attempts: &mut Vec<String>) -> Result<Option<Function>> {
        let parts = segments(name, name)?;

        for split in (1..parts.len()).rev() {
            let module = parts[..split].join(".");
            let attribute = &parts[split..];
            attempts.push(format!("module '{}' attribute '{}'", module, attribute.join(".")));

            if let Some(found) = self.modules.get(&module).and_then(|ns| ns.lookup(attribute)) {
                debug!("Resolved '{}' in module '{}'", name, module);
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    fn resolve_file(
        &self,
        symbol: &str,
        path: &str,
        base_dir: &Path,
        attempts: &mut Vec<String>,
    ) -> Result<Option<Function>> {
        let parts = segments(symbol, &format!("{} {}", symbol, path))?;
        let path = base_dir.join(path);
        attempts.push(format!("symbol '{}' from '{}'", symbol, path.display()));

        let Some(loader) = &self.loader else {
            attempts.push("no module loader configured".to_string());
            return Ok(None);
        };

        match loader.load(&path) {
            Ok(namespace) => Ok(namespace.lookup(&parts)),
            Err(e) => {
                attempts.push(format!("{} loader: {:#}", loader.loader_type(), e));
                Ok(None)
            }
        }
    }

    /// Names of every registered function, module functions as dotted paths
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.keys().cloned().collect();
        for (module, namespace) in &self.modules {
            names.extend(
                namespace
                    .function_names()
                    .into_iter()
                    .map(|name| format!("{}.{}", module, name)),
            );
        }
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.list_functions())
            .field("loader", &self.loader.as_ref().map(|l| l.loader_type()))
            .finish()
    }
}

fn malformed(name: &str, reason: &str) -> ResolveError {
    ResolveError::MalformedName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn segments<'a>(dotted: &'a str, name: &str) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = dotted.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(malformed(name, "empty path segment"));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::YamlModuleLoader;
    use std::io::Write;
    use tempfile::TempDir;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        registry.register("ret_kwargs", |args| Ok(Value::Mapping(args.clone())));
        registry.register_module(
            "demo",
            Namespace::new()
                .with_function("ret_a_list", |_| Ok(Value::from(vec![42])))
                .with_namespace(
                    "aClass",
                    Namespace::new().with_function("invented_list", |_| {
                        Ok(Value::from(vec!["hello", "from", "namespace"]))
                    }),
                ),
        );
        registry.register_module(
            "demo.aClass",
            Namespace::new().with_function("invented_list", |_| Ok(Value::from("longest prefix"))),
        );
        registry
    }

    #[test]
    fn test_global_exact_match() {
        let registry = registry();
        let mut args = Mapping::new();
        args.insert(Value::from("x"), Value::from(1));

        let f = registry.resolve("ret_kwargs", Path::new(".")).unwrap();
        assert_eq!(f(&args).unwrap(), Value::Mapping(args));
    }

    #[test]
    fn test_dotted_prefers_longest_module() {
        let registry = registry();

        let f = registry.resolve("demo.aClass.invented_list", Path::new(".")).unwrap();
        assert_eq!(f(&Mapping::new()).unwrap(), Value::from("longest prefix"));

        let f = registry.resolve("demo.ret_a_list", Path::new(".")).unwrap();
        assert_eq!(f(&Mapping::new()).unwrap(), Value::from(vec![42]));
    }

    #[test]
    fn test_import_failure_lists_attempts() {
        let error = registry()
            .resolve("nonexistent.module.func", Path::new("."))
            .err()
            .unwrap();

        match error {
            ResolveError::ImportFailure { name, attempts } => {
                assert_eq!(name, "nonexistent.module.func");
                assert_eq!(attempts.len(), 3);
                assert!(attempts[1].contains("nonexistent.module"));
                assert!(attempts[2].contains("'nonexistent'"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_malformed_names() {
        let registry = registry();
        for name in ["", "a..b", ".a", "a b c"] {
            assert!(
                matches!(
                    registry.resolve(name, Path::new(".")),
                    Err(ResolveError::MalformedName { .. })
                ),
                "name {:?}",
                name
            );
        }
    }

    #[test]
    fn test_symbol_path_form() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("data.yaml")).unwrap();
        writeln!(file, "Tables:\n  answer: 42").unwrap();

        let mut registry = registry();
        let error = registry
            .resolve("Tables.answer data.yaml", dir.path())
            .err()
            .unwrap();
        assert!(matches!(error, ResolveError::ImportFailure { .. }));

        registry.set_loader(Box::new(YamlModuleLoader));
        let f = registry.resolve("Tables.answer data.yaml", dir.path()).unwrap();
        assert_eq!(f(&Mapping::new()).unwrap(), Value::from(42));

        assert!(registry.resolve("Tables.missing data.yaml", dir.path()).is_err());
    }

    #[test]
    fn test_list_functions() {
        let names = registry().list_functions();
        assert!(names.contains(&"ret_kwargs".to_string()));
        assert!(names.contains(&"demo.aClass.invented_list".to_string()));
    }
}
