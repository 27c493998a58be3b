// ABOUTME: Template evaluator running block lists against a shared meta context
// ABOUTME: Resolves template sources, accumulates block outputs and reports the failing block

use serde_yaml::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::context::{Meta, Scope};
use super::error::{ExecutionError, Result};
use super::result::Output;
use crate::functions::{FunctionRegistry, Host};
use crate::parser::{Accumulate, TemplateDocument};
use crate::template::Substituter;
use crate::value::Format;

/// Anything a template can be evaluated from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A template document file
    Path(PathBuf),
    /// Template document text
    Yaml(String),
    /// An already loaded document
    Document(TemplateDocument),
    /// A bare block list
    Blocks(Vec<Value>),
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        TemplateSource::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        TemplateSource::Path(path)
    }
}

impl From<TemplateDocument> for TemplateSource {
    fn from(document: TemplateDocument) -> Self {
        TemplateSource::Document(document)
    }
}

impl From<Vec<Value>> for TemplateSource {
    fn from(blocks: Vec<Value>) -> Self {
        TemplateSource::Blocks(blocks)
    }
}

/// Evaluates templates.
///
/// Function resolution and the optional host are shared between clones; the
/// meta context is owned by each top-level call.
#[derive(Clone)]
pub struct ReplacementEngine {
    pub(super) substituter: Substituter,
    pub(super) functions: Arc<FunctionRegistry>,
    pub(super) host: Option<Arc<dyn Host>>,
}

impl ReplacementEngine {
    /// Engine with no registered functions and no host
    pub fn new() -> Self {
        Self {
            substituter: Substituter::new(),
            functions: Arc::new(FunctionRegistry::new()),
            host: None,
        }
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Arc::new(functions);
        self
    }

    /// Enable `eval` and `exec` blocks
    pub fn with_host<H: Host + 'static>(mut self, host: H) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn host_enabled(&self) -> bool {
        self.host.is_some()
    }

    /// Render a template to text, starting from `meta`.
    ///
    /// The context lives only for this call and is not handed back.
    pub fn render<S: Into<TemplateSource>>(&self, source: S, meta: Meta) -> Result<String> {
        let mut meta = meta;
        let output = self.evaluate(source.into(), &mut meta, &Scope::root(), Accumulate::Text)?;
        Ok(output.into_text(Format::Yaml, meta.eol())?)
    }

    /// Render template document text
    pub fn render_to_string(&self, yaml: &str, meta: Meta) -> Result<String> {
        self.render(TemplateSource::Yaml(yaml.to_string()), meta)
    }

    /// Evaluate a template source into an accumulator of the given kind
    pub fn evaluate(
        &self,
        source: TemplateSource,
        meta: &mut Meta,
        scope: &Scope,
        accumulate: Accumulate,
    ) -> Result<Output> {
        match source {
            TemplateSource::Path(path) => self.evaluate_file(&scope.resolve(path), meta, accumulate),
            TemplateSource::Yaml(text) => {
                let document = TemplateDocument::from_yaml(&text)?;
                self.evaluate_document(&document, meta, scope, accumulate)
            }
            TemplateSource::Document(document) => {
                self.evaluate_document(&document, meta, scope, accumulate)
            }
            TemplateSource::Blocks(blocks) => self.evaluate_blocks(&blocks, meta, scope, accumulate),
        }
    }

    /// Evaluate a template document file; its blocks resolve relative paths
    /// against the file's directory.
    pub fn evaluate_file(&self, path: &Path, meta: &mut Meta, accumulate: Accumulate) -> Result<Output> {
        info!("Evaluating template '{}'", path.display());
        let document = TemplateDocument::from_file(path)?;
        self.evaluate_document(&document, meta, &Scope::root(), accumulate)
    }

    fn evaluate_document(
        &self,
        document: &TemplateDocument,
        meta: &mut Meta,
        scope: &Scope,
        accumulate: Accumulate,
    ) -> Result<Output> {
        let scope = match document.base_dir() {
            Some(dir) => Scope::new(dir),
            None => scope.clone(),
        };
        self.evaluate_blocks(&document.blocks, meta, &scope, accumulate)
    }

    /// Run blocks in order, folding their outputs into one accumulator.
    ///
    /// The first failure aborts the whole list. The frame running the failing
    /// block logs it with the current meta and wraps the error in
    /// [`ExecutionError::BlockFailed`]; enclosing frames pass that along as is.
    #[instrument(skip(self, blocks, meta, scope), fields(blocks = blocks.len()))]
    pub fn evaluate_blocks(
        &self,
        blocks: &[Value],
        meta: &mut Meta,
        scope: &Scope,
        accumulate: Accumulate,
    ) -> Result<Output> {
        let mut output = Output::empty(accumulate);

        for (index, block) in blocks.iter().enumerate() {
            let result = match self.execute_block(block, meta, scope) {
                Ok(Some(produced)) if !produced.is_empty() => output
                    .absorb(produced, meta.eol())
                    .map_err(ExecutionError::from),
                Ok(_) => Ok(()),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {}
                Err(e @ ExecutionError::BlockFailed { .. }) => return Err(e),
                Err(e) => {
                    report_failure(index, block, meta, &e);
                    return Err(ExecutionError::BlockFailed {
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(output)
    }
}

impl Default for ReplacementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReplacementEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacementEngine")
            .field("functions", &self.functions)
            .field("host", &self.host.as_ref().map(|host| host.host_type()))
            .finish()
    }
}

fn report_failure(index: usize, block: &Value, meta: &Meta, error: &ExecutionError) {
    let block_yaml = serde_yaml::to_string(block).unwrap_or_else(|e| format!("<unprintable block: {}>", e));
    error!(
        "Block {} failed: {}\n# block\n{}# meta\n{}",
        index,
        error,
        block_yaml,
        meta.to_yaml()
    );
}
