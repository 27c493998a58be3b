// ABOUTME: Substitution entry point applying a named strategy to strings, lines and structures
// ABOUTME: Owns the Handlebars registry and enforces the trailing line terminator normalization

use handlebars::Handlebars;
use serde_yaml::{Mapping, Value};

use super::context::{eol, to_json};
use super::error::Result;
use super::strategy::{self, Strategy};

#[derive(Clone)]
pub struct Substituter {
    handlebars: Handlebars<'static>,
}

impl Substituter {
    /// Create a substituter with a strict, non-escaping Handlebars registry
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(true);
        handlebars.set_dev_mode(false);

        // Output is plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Substitute `text` against `context` and strip any trailing line terminator.
    pub fn substitute(&self, text: &str, context: &Mapping, strategy: Strategy) -> Result<String> {
        let rendered = match strategy {
            Strategy::Passthrough => text.to_string(),
            Strategy::Format => strategy::format(text, context)?,
            Strategy::Substitute => strategy::substitute(text, context, false)?,
            Strategy::SafeSubstitute => strategy::substitute(text, context, true)?,
            Strategy::Handlebars => self
                .handlebars
                .render_template(text, &to_json(context)?)?,
        };

        Ok(rendered.trim_end_matches(eol(context)).to_string())
    }

    /// Substitute each line of `text` independently, keeping its terminator.
    pub fn substitute_lines(
        &self,
        text: &str,
        context: &Mapping,
        strategy: Strategy,
    ) -> Result<String> {
        let eol = eol(context);
        let mut out = String::with_capacity(text.len());

        for line in text.split_inclusive(eol) {
            let (content, terminated) = match line.strip_suffix(eol) {
                Some(content) => (content, true),
                None => (line, false),
            };
            out.push_str(&self.substitute(content, context, strategy)?);
            if terminated {
                out.push_str(eol);
            }
        }

        Ok(out)
    }

    /// Substitute the string values of `fields` without descending into
    /// nested mappings or sequences.
    pub fn substitute_fields(
        &self,
        fields: &Mapping,
        context: &Mapping,
        strategy: Strategy,
    ) -> Result<Mapping> {
        let mut resolved = Mapping::with_capacity(fields.len());
        for (key, value) in fields {
            let value = match value {
                Value::String(s) => Value::String(self.substitute(s, context, strategy)?),
                other => other.clone(),
            };
            resolved.insert(key.clone(), value);
        }
        Ok(resolved)
    }

    /// Recursively substitute every string inside `value`
    pub fn substitute_value(
        &self,
        value: Value,
        context: &Mapping,
        strategy: Strategy,
    ) -> Result<Value> {
        match value {
            Value::String(s) => Ok(Value::String(self.substitute(&s, context, strategy)?)),
            Value::Mapping(map) => Ok(Value::Mapping(
                self.substitute_mapping(map, context, strategy)?,
            )),
            Value::Sequence(seq) => {
                let resolved: Result<Vec<Value>> = seq
                    .into_iter()
                    .map(|v| self.substitute_value(v, context, strategy))
                    .collect();
                Ok(Value::Sequence(resolved?))
            }
            // Numbers, booleans, nulls and tags are not text
            other => Ok(other),
        }
    }

    /// Recursively substitute every string value inside a mapping
    pub fn substitute_mapping(
        &self,
        map: Mapping,
        context: &Mapping,
        strategy: Strategy,
    ) -> Result<Mapping> {
        let mut resolved = Mapping::with_capacity(map.len());
        for (key, value) in map {
            resolved.insert(key, self.substitute_value(value, context, strategy)?);
        }
        Ok(resolved)
    }
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::SubstitutionError;

    fn context(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_every_strategy_strips_trailing_eol() {
        let substituter = Substituter::new();
        let ctx = context("name: World");

        for strategy in [
            Strategy::Passthrough,
            Strategy::Format,
            Strategy::Substitute,
            Strategy::SafeSubstitute,
            Strategy::Handlebars,
        ] {
            let result = substituter.substitute("hi\n\n", &ctx, strategy).unwrap();
            assert_eq!(result, "hi", "strategy {}", strategy.as_str());
        }
    }

    #[test]
    fn test_custom_eol_is_stripped() {
        let substituter = Substituter::new();
        let ctx = context("eol: \"\\r\\n\"");

        let result = substituter
            .substitute("line\r\n", &ctx, Strategy::Passthrough)
            .unwrap();
        assert_eq!(result, "line");
    }

    #[test]
    fn test_handlebars_strategy() {
        let substituter = Substituter::new();
        let ctx = context("name: <World>");

        let result = substituter
            .substitute("Hello {{name}}!", &ctx, Strategy::Handlebars)
            .unwrap();
        assert_eq!(result, "Hello <World>!");

        let missing = substituter.substitute("{{nope}}", &ctx, Strategy::Handlebars);
        assert!(matches!(missing, Err(SubstitutionError::HandlebarsError(_))));
    }

    #[test]
    fn test_substitute_lines_keeps_terminators() {
        let substituter = Substituter::new();
        let ctx = context("a: 1\nb: 2");

        let result = substituter
            .substitute_lines("${a}\n${b}\nend", &ctx, Strategy::Substitute)
            .unwrap();
        assert_eq!(result, "1\n2\nend");
    }

    #[test]
    fn test_substitute_fields_is_shallow() {
        let substituter = Substituter::new();
        let ctx = context("who: me");
        let fields = context("input: '${who}'\nnested: {inner: '${who}'}\ncount: 3");

        let resolved = substituter
            .substitute_fields(&fields, &ctx, Strategy::Substitute)
            .unwrap();

        assert_eq!(resolved.get("input"), Some(&Value::from("me")));
        assert_eq!(resolved.get("nested"), fields.get("nested"));
        assert_eq!(resolved.get("count"), Some(&Value::from(3)));
    }

    #[test]
    fn test_substitute_value_recurses() {
        let substituter = Substituter::new();
        let ctx = context("who: me");
        let value: Value =
            serde_yaml::from_str("top: '{who}'\nnested: {inner: '{who}'}\nlist: ['{who}', 7]")
                .unwrap();

        let resolved = substituter
            .substitute_value(value, &ctx, Strategy::Format)
            .unwrap();

        assert_eq!(resolved["top"], Value::from("me"));
        assert_eq!(resolved["nested"]["inner"], Value::from("me"));
        assert_eq!(resolved["list"][0], Value::from("me"));
        assert_eq!(resolved["list"][1], Value::from(7));
    }
}
