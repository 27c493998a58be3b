// ABOUTME: Execution of a single block: prep, directive selection, acquisition and shaping
// ABOUTME: Maps each (yield, source) pair onto its acquisition and output shaping step

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::context::{Meta, Scope};
use super::error::{ExecutionError, Result};
use super::executor::ReplacementEngine;
use super::result::Output;
use crate::parser::block::PREP_KEY;
use crate::parser::{Block, Input, ParserError, Source, Yield};
use crate::value::{self, describe};

/// A value obtained by a block's source, before shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    /// Verbatim text: file contents, executed code output, nested text output
    Stream(String),
    Value(Value),
}

impl From<Output> for Acquired {
    fn from(output: Output) -> Self {
        match output {
            Output::Text(text) => Acquired::Stream(text),
            Output::Data(data) => Acquired::Value(data),
        }
    }
}

impl Acquired {
    fn into_value(self) -> Value {
        match self {
            Acquired::Stream(text) => Value::String(text),
            Acquired::Value(value) => value,
        }
    }
}

impl ReplacementEngine {
    /// Execute one raw block against the shared context.
    ///
    /// Returns `None` for `meta` blocks, whose only effect is on `meta`.
    pub fn execute_block(
        &self,
        raw: &Value,
        meta: &mut Meta,
        scope: &Scope,
    ) -> Result<Option<Output>> {
        let fields = match raw {
            Value::Mapping(fields) => fields,
            other => {
                return Err(ParserError::InvalidBlock(format!(
                    "expected a mapping, found {}",
                    describe(other)
                ))
                .into())
            }
        };

        // The block templates itself before it is parsed
        let prep = Block::strategy(fields, PREP_KEY);
        let fields = self
            .substituter
            .substitute_fields(fields, meta.as_mapping(), prep)?;
        let block = Block::parse(&fields)?;

        debug!(
            "Dispatching '{}' block on {} input",
            block.directive,
            block.input.kind().as_str()
        );

        let acquired = self.acquire(&block, meta, scope)?;
        self.shape(&block, acquired, meta)
    }

    fn acquire(&self, block: &Block, meta: &mut Meta, scope: &Scope) -> Result<Acquired> {
        let directive = block.directive;

        match (directive.source, &block.input) {
            (Source::Text, Input::Scalar(text)) => Ok(Acquired::Value(Value::String(text.clone()))),
            (Source::Text, Input::Data(map)) => Ok(Acquired::Value(Value::Mapping(map.clone()))),

            (Source::Dict, Input::Scalar(text)) => Ok(Acquired::Value(Value::String(text.clone()))),
            (Source::Dict, Input::Data(map)) => {
                let map = self
                    .substituter
                    .substitute_mapping(map.clone(), meta.as_mapping(), block.prep)?;
                Ok(Acquired::Value(Value::Mapping(map)))
            }

            (Source::File, Input::Scalar(path)) => {
                let path = scope.resolve(path);
                let mut content = std::fs::read_to_string(&path)
                    .map_err(|source| ExecutionError::IoError { path, source })?;
                let eol = meta.eol();
                if !content.is_empty() && !content.ends_with(eol) {
                    content.push_str(eol);
                }
                Ok(Acquired::Stream(content))
            }

            (Source::Eval, Input::Scalar(expr)) => {
                let host = self.host_for(block)?;
                host.eval(expr, meta.as_mapping(), scope.base_dir())
                    .map(Acquired::Value)
                    .map_err(|e| host_failure(block, e))
            }

            (Source::Exec, Input::Scalar(code)) => {
                let host = self.host_for(block)?;
                host.exec(code, meta.as_mapping(), scope.base_dir())
                    .map(Acquired::Stream)
                    .map_err(|e| host_failure(block, e))
            }

            (Source::Func, Input::Scalar(name)) => {
                let function = self.functions.resolve(name, scope.base_dir())?;
                let args = self
                    .substituter
                    .substitute_fields(&block.args, meta.as_mapping(), block.prep)?;

                debug!("Calling '{}' with {} args", name, args.len());
                function(&args)
                    .map(Acquired::Value)
                    .map_err(|e| ExecutionError::FunctionFailed {
                        name: name.clone(),
                        message: format!("{:#}", e),
                    })
            }

            (Source::Replacement, Input::Scalar(path)) => {
                let accumulate = directive.yield_kind.accumulate();
                let path = scope.resolve(path);
                self.evaluate_file(&path, meta, accumulate).map(Acquired::from)
            }

            (Source::Nested(accumulate), Input::Blocks(blocks)) => self
                .evaluate_blocks(blocks, meta, scope, accumulate)
                .map(Acquired::from),

            (source, input) => Err(ParserError::InvalidBlock(format!(
                "'{}' cannot read {} input",
                source.as_str(),
                input.kind().as_str()
            ))
            .into()),
        }
    }

    fn shape(&self, block: &Block, acquired: Acquired, meta: &mut Meta) -> Result<Option<Output>> {
        let format = block.options.format();

        match block.directive.yield_kind {
            Yield::Text => {
                let text = match acquired {
                    Acquired::Stream(text) => text,
                    Acquired::Value(value) => value::stringify(&value, format, meta.eol())?,
                };
                let text = self
                    .substituter
                    .substitute_lines(&text, meta.as_mapping(), block.proc)?;
                Ok(Some(Output::Text(text)))
            }
            Yield::Dict => {
                let map = self.structured(block, acquired, meta)?;
                Ok(Some(Output::Data(Value::Mapping(map))))
            }
            Yield::Meta => {
                let map = self.structured(block, acquired, meta)?;
                debug!("Setting {} meta keys", map.len());
                meta.absorb(map);
                Ok(None)
            }
        }
    }

    /// Coerce to a mapping (wrapped under `key` if given), then apply `proc`
    fn structured(&self, block: &Block, acquired: Acquired, meta: &Meta) -> Result<Mapping> {
        let map = value::structure(
            acquired.into_value(),
            block.key.as_deref(),
            block.options.format(),
            meta.eol(),
        )?;

        Ok(self
            .substituter
            .substitute_mapping(map, meta.as_mapping(), block.proc)?)
    }

    fn host_for(&self, block: &Block) -> Result<&dyn crate::functions::Host> {
        self.host
            .as_deref()
            .ok_or_else(|| ExecutionError::HostDisabled {
                directive: block.directive.to_string(),
            })
    }
}

fn host_failure(block: &Block, error: anyhow::Error) -> ExecutionError {
    ExecutionError::HostFailure {
        directive: block.directive.to_string(),
        message: format!("{:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionRegistry;
    use crate::template::SubstitutionError;

    fn block(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_text_block_appends_eol() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::new();

        let output = engine
            .execute_block(&block("{text: text, input: hello}"), &mut meta, &Scope::root())
            .unwrap();
        assert_eq!(output, Some(Output::Text("hello\n".to_string())));
    }

    #[test]
    fn test_proc_substitutes_lines() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::from_pairs([("name", "world")]);

        let output = engine
            .execute_block(
                &block("{text: text, proc: format, input: \"a {name}\\nb {name}\"}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();
        assert_eq!(output, Some(Output::Text("a world\nb world\n".to_string())));

        let output = engine
            .execute_block(
                &block("{text: dict, proc: substitute, input: {greeting: hello $name}}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();
        assert_eq!(
            output,
            Some(Output::Text("---\ngreeting: hello world\n...\n".to_string()))
        );
    }

    #[test]
    fn test_prep_rewrites_fields() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::from_pairs([("kind", "text"), ("who", "there")]);

        let output = engine
            .execute_block(
                &block("{text: '{kind}', prep: format, input: 'hi {who}'}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();
        assert_eq!(output, Some(Output::Text("hi there\n".to_string())));
    }

    #[test]
    fn test_meta_block_updates_context() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::new();

        let output = engine
            .execute_block(
                &block("{meta: text, key: note, input: remember me}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();

        assert!(output.is_none());
        assert_eq!(meta.get("note"), Some(&Value::from("remember me\n")));
    }

    #[test]
    fn test_dict_prep_recurses_into_input() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::from_pairs([("x", "1")]);

        let output = engine
            .execute_block(
                &block("{dict: dict, prep: substitute, input: {a: {b: '$x'}, c: ['${x}']}}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();

        assert_eq!(
            output,
            Some(Output::Data(block("{a: {b: '1'}, c: ['1']}")))
        );
    }

    #[test]
    fn test_strict_substitution_failure() {
        let engine = ReplacementEngine::new();
        let mut meta = Meta::new();

        let error = engine
            .execute_block(
                &block("{text: text, proc: substitute, input: '${missing}'}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap_err();
        assert!(matches!(
            error,
            ExecutionError::SubstitutionError(SubstitutionError::MissingKey(ref key)) if key == "missing"
        ));
    }

    #[test]
    fn test_func_receives_prepped_args() {
        let mut functions = FunctionRegistry::new();
        functions.register("ret_kwargs", |args| Ok(Value::Mapping(args.clone())));
        let engine = ReplacementEngine::new().with_functions(functions);
        let mut meta = Meta::from_pairs([("user", "ada")]);

        let output = engine
            .execute_block(
                &block("{dict: func, prep: format, input: ret_kwargs, args: {name: '{user}', n: 3}}"),
                &mut meta,
                &Scope::root(),
            )
            .unwrap();
        assert_eq!(output, Some(Output::Data(block("{name: ada, n: 3}"))));
    }

    #[test]
    fn test_illegal_pair_for_input_kind() {
        let engine = ReplacementEngine::new();
        let error = engine
            .execute_block(&block("{text: file, input: {a: 1}}"), &mut Meta::new(), &Scope::root())
            .unwrap_err();
        assert!(matches!(
            error,
            ExecutionError::ParserError(ParserError::NoValidDirective { .. })
        ));
    }
}
