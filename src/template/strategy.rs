// ABOUTME: Named text substitution strategies applied to single strings
// ABOUTME: Implements brace-style formatting and dollar-style strict/safe substitution

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::context::{display, lookup};
use super::error::{Result, SubstitutionError};

/// A named substitution strategy, selected by a block's `prep`/`proc` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// `passthrough` / `literal`: text is returned unchanged
    #[default]
    Passthrough,
    /// `format`: `{name}` fields, failing on unknown names
    Format,
    /// `substitute`: `$name` / `${name}`, failing on unknown names
    Substitute,
    /// `safe_substitute`: like `substitute`, leaving unknown names verbatim
    SafeSubstitute,
    /// `handlebars`: `{{name}}` rendered in strict mode
    Handlebars,
}

impl Strategy {
    /// Select a strategy by name; absent or unknown names fall back to passthrough.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some("passthrough") | Some("literal") => Strategy::Passthrough,
            Some("format") => Strategy::Format,
            Some("substitute") => Strategy::Substitute,
            Some("safe_substitute") => Strategy::SafeSubstitute,
            Some("handlebars") => Strategy::Handlebars,
            Some(other) => {
                debug!("Unknown substitution strategy '{}', using passthrough", other);
                Strategy::Passthrough
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Passthrough => "passthrough",
            Strategy::Format => "format",
            Strategy::Substitute => "substitute",
            Strategy::SafeSubstitute => "safe_substitute",
            Strategy::Handlebars => "handlebars",
        }
    }
}

/// Brace-style formatting against keyword fields of `context`.
///
/// Supports `{name}`, `{name.key}`, `{name[key]}`, `{name[0]}`, the `!s`/`!r`
/// conversions and a `[[fill]align][width][.precision]` spec. `{{` and `}}`
/// produce literal braces. Positional fields always fail: there are no
/// positional arguments.
pub fn format(text: &str, context: &Mapping) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if let Some(&(_, '{')) = chars.peek() {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut field = String::new();
                let mut closed = false;
                for (_, fc) in chars.by_ref() {
                    match fc {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(SubstitutionError::MalformedFormat(format!(
                                "nested replacement field at offset {} in '{}'",
                                offset, text
                            )))
                        }
                        other => field.push(other),
                    }
                }
                if !closed {
                    return Err(SubstitutionError::MalformedFormat(format!(
                        "unmatched '{{' at offset {} in '{}'",
                        offset, text
                    )));
                }

                out.push_str(&render_field(&field, context)?);
            }
            '}' => {
                if let Some(&(_, '}')) = chars.peek() {
                    chars.next();
                    out.push('}');
                    continue;
                }
                return Err(SubstitutionError::MalformedFormat(format!(
                    "single '}}' at offset {} in '{}'",
                    offset, text
                )));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn render_field(field: &str, context: &Mapping) -> Result<String> {
    let (head, spec) = match field.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (field, None),
    };

    let name = match head.split_once('!') {
        Some((name, "s" | "r" | "a")) => name,
        Some((_, conversion)) => {
            return Err(SubstitutionError::MalformedFormat(format!(
                "unknown conversion '!{}' in field '{{{}}}'",
                conversion, field
            )))
        }
        None => head,
    };

    let rendered = display(resolve_field(name, context)?);
    match spec {
        Some(spec) if !spec.is_empty() => apply_spec(&rendered, spec),
        _ => Ok(rendered),
    }
}

fn resolve_field<'a>(name: &str, context: &'a Mapping) -> Result<&'a Value> {
    let end = name.find(|c| c == '.' || c == '[').unwrap_or(name.len());
    let (first, mut rest) = name.split_at(end);

    if first.is_empty() || first.chars().all(|c| c.is_ascii_digit()) {
        let index = if first.is_empty() { "0" } else { first };
        return Err(SubstitutionError::MissingKey(index.to_string()));
    }

    let mut value =
        lookup(context, first).ok_or_else(|| SubstitutionError::MissingKey(first.to_string()))?;

    while !rest.is_empty() {
        let (key, remainder) = if let Some(attribute) = rest.strip_prefix('.') {
            let end = attribute
                .find(|c| c == '.' || c == '[')
                .unwrap_or(attribute.len());
            attribute.split_at(end)
        } else if let Some(index) = rest.strip_prefix('[') {
            let end = index.find(']').ok_or_else(|| {
                SubstitutionError::MalformedFormat(format!("missing ']' in field '{}'", name))
            })?;
            (&index[..end], &index[end + 1..])
        } else {
            return Err(SubstitutionError::MalformedFormat(format!(
                "invalid field name '{}'",
                name
            )));
        };

        value = access(value, key).ok_or_else(|| SubstitutionError::MissingKey(name.to_string()))?;
        rest = remainder;
    }

    Ok(value)
}

fn access<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Mapping(map) => map.get(key),
        Value::Sequence(seq) => key.parse::<usize>().ok().and_then(|i| seq.get(i)),
        Value::Tagged(tagged) => access(&tagged.value, key),
        _ => None,
    }
}

fn apply_spec(text: &str, spec: &str) -> Result<String> {
    let malformed = || SubstitutionError::MalformedFormat(format!("invalid format spec '{}'", spec));

    let chars: Vec<char> = spec.chars().collect();
    let (fill, align, consumed) = match chars.as_slice() {
        [fill, align @ ('<' | '>' | '^'), ..] => (*fill, Some(*align), 2),
        [align @ ('<' | '>' | '^'), ..] => (' ', Some(*align), 1),
        _ => (' ', None, 0),
    };

    let rest: String = chars[consumed..].iter().collect();
    let (width, precision) = match rest.split_once('.') {
        Some((width, precision)) => (width, Some(precision)),
        None => (rest.as_str(), None),
    };

    let width = if width.is_empty() {
        0
    } else {
        width.parse::<usize>().map_err(|_| malformed())?
    };
    let precision = precision
        .map(|p| p.parse::<usize>())
        .transpose()
        .map_err(|_| malformed())?;

    let body: String = match precision {
        Some(precision) => text.chars().take(precision).collect(),
        None => text.to_string(),
    };

    let len = body.chars().count();
    if len >= width {
        return Ok(body);
    }

    let pad = width - len;
    let (left, right) = match align.unwrap_or('<') {
        '>' => (pad, 0),
        '^' => (pad / 2, pad - pad / 2),
        _ => (0, pad),
    };
    let fill = fill.to_string();
    Ok(format!("{}{}{}", fill.repeat(left), body, fill.repeat(right)))
}

/// Dollar-style substitution against `context`.
///
/// `$$` is an escaped dollar sign; `$name` and `${name}` are placeholders with
/// identifiers `[_A-Za-z][_A-Za-z0-9]*`. With `safe` set, unknown names and
/// invalid placeholders are left verbatim instead of failing.
pub fn substitute(text: &str, context: &Mapping, safe: bool) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let offset = text.len() - rest.len() + pos;
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let placeholder = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if is_identifier(&braced[..end]) => Some((&braced[..end], end + 2)),
                _ => None,
            }
        } else {
            match identifier_len(after) {
                0 => None,
                len => Some((&after[..len], len)),
            }
        };

        match placeholder {
            Some((name, consumed)) => {
                match lookup(context, name) {
                    Some(value) => out.push_str(&display(value)),
                    None if safe => out.push_str(&rest[pos..pos + 1 + consumed]),
                    None => return Err(SubstitutionError::MissingKey(name.to_string())),
                }
                rest = &after[consumed..];
            }
            None if safe => {
                out.push('$');
                rest = after;
            }
            None => {
                return Err(SubstitutionError::InvalidPlaceholder {
                    offset,
                    text: text.to_string(),
                })
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn identifier_len(text: &str) -> usize {
    let mut len = 0;
    for (i, c) in text.char_indices() {
        let valid = if i == 0 {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c.is_ascii_alphanumeric()
        };
        if !valid {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_len(text) == text.len()
}
