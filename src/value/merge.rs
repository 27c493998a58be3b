// ABOUTME: Generic deep merge of mappings, sequences and scalars
// ABOUTME: Colliding values escalate scalar to list to merged structure instead of overwriting

use serde_yaml::{Mapping, Value};

use super::error::{Result, ValueError};

/// The three shapes merge distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Mapping,
    Sequence,
    Scalar,
}

/// Classify a value for merging. Tagged values have no defined merge shape.
pub fn classify(value: &Value) -> Result<Shape> {
    match value {
        Value::Mapping(_) => Ok(Shape::Mapping),
        Value::Sequence(_) => Ok(Shape::Sequence),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(Shape::Scalar),
        Value::Tagged(tagged) => Err(ValueError::UnmergeableType(format!(
            "tagged value {}",
            tagged.tag
        ))),
    }
}

/// Short name of a value's type, for diagnostics
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// One unit contributed by a merge source
enum Item {
    Keyed(Value, Value),
    Keyless(Value),
}

fn items(source: Value) -> Result<Vec<Item>> {
    let shape = classify(&source)?;
    Ok(match (shape, source) {
        (Shape::Mapping, Value::Mapping(map)) => map
            .into_iter()
            .map(|(key, value)| Item::Keyed(key, value))
            .collect(),
        (Shape::Sequence, Value::Sequence(seq)) => seq.into_iter().map(Item::Keyless).collect(),
        (_, scalar) => vec![Item::Keyless(scalar)],
    })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Merge `source` into `target` in place.
///
/// An empty target starts out as an empty mapping. Into a mapping, new keys
/// are inserted, equal values are left alone and differing values are merged
/// recursively. Any other target becomes a sequence (wrapping a scalar first)
/// and every incoming item is appended, keyed items as single-entry mappings.
pub fn merge(target: &mut Value, source: Value) -> Result<()> {
    // A failed merge leaves the target untouched
    let items = items(source)?;

    if is_empty(target) {
        *target = Value::Mapping(Mapping::new());
    }

    if let Value::Mapping(map) = target {
        return insert_items(map, items);
    }

    if !matches!(target, Value::Sequence(_)) {
        let scalar = std::mem::take(target);
        *target = Value::Sequence(vec![scalar]);
    }

    if let Value::Sequence(seq) = target {
        for item in items {
            seq.push(match item {
                Item::Keyed(key, value) => {
                    let mut entry = Mapping::new();
                    entry.insert(key, value);
                    Value::Mapping(entry)
                }
                Item::Keyless(value) => value,
            });
        }
    }

    Ok(())
}

/// Merge every source into `target`, in order, and return the result.
pub fn merged<I>(mut target: Value, sources: I) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    for source in sources {
        merge(&mut target, source)?;
    }
    Ok(target)
}

fn insert_items(map: &mut Mapping, items: Vec<Item>) -> Result<()> {
    for item in items {
        let (key, value) = match item {
            Item::Keyed(key, value) => (key, value),
            Item::Keyless(key) => (key, Value::Null),
        };

        if let Some(existing) = map.get_mut(&key) {
            // NOTE: two differing scalars become a two-element sequence here
            if *existing != value {
                merge(existing, value)?;
            }
        } else {
            map.insert(key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&yaml("{a: 1}")).unwrap(), Shape::Mapping);
        assert_eq!(classify(&yaml("[1, 2]")).unwrap(), Shape::Sequence);
        assert_eq!(classify(&yaml("text")).unwrap(), Shape::Scalar);
        assert_eq!(classify(&Value::Null).unwrap(), Shape::Scalar);
        assert!(matches!(
            classify(&yaml("!custom 3")),
            Err(ValueError::UnmergeableType(_))
        ));
    }

    #[test]
    fn test_collision_escalation() {
        let once = merged(yaml("{a: 1}"), [yaml("{a: 2}")]).unwrap();
        assert_eq!(once, yaml("{a: [1, 2]}"));

        let twice = merged(once, [yaml("{a: 3}")]).unwrap();
        assert_eq!(twice, yaml("{a: [1, 2, 3]}"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let x = yaml("{a: 1, b: {c: text}}");
        let y = yaml("{b: {c: text, d: 4}, e: [1]}");

        let once = merged(x, [y.clone()]).unwrap();
        let again = merged(once.clone(), [y]).unwrap();
        assert_eq!(once, again);
        assert_eq!(once, yaml("{a: 1, b: {c: text, d: 4}, e: [1]}"));
    }

    #[test]
    fn test_non_mapping_targets() {
        assert_eq!(merged(yaml("[1, 2]"), [yaml("3")]).unwrap(), yaml("[1, 2, 3]"));
        assert_eq!(merged(yaml("1"), [yaml("2")]).unwrap(), yaml("[1, 2]"));
        assert_eq!(
            merged(yaml("[x]"), [yaml("{k: v}")]).unwrap(),
            yaml("[x, {k: v}]")
        );
    }

    #[test]
    fn test_empty_target_becomes_mapping() {
        assert_eq!(merged(Value::Null, [yaml("{a: 1}")]).unwrap(), yaml("{a: 1}"));
        assert_eq!(merged(yaml("[]"), [yaml("[a, b]")]).unwrap(), yaml("{a: null, b: null}"));
        assert_eq!(merged(yaml("''"), [yaml("word")]).unwrap(), yaml("{word: null}"));
    }

    #[test]
    fn test_nested_mappings_merge_deeply() {
        let result = merged(
            yaml("{server: {host: a, ports: [80]}}"),
            [yaml("{server: {host: a, ports: [443], tls: true}}")],
        )
        .unwrap();

        assert_eq!(result, yaml("{server: {host: a, ports: [80, 443], tls: true}}"));
    }

    #[test]
    fn test_multiple_sources_in_order() {
        let result = merged(
            Value::Null,
            [yaml("{a: 1}"), yaml("{b: 2}"), yaml("{a: 9}")],
        )
        .unwrap();
        assert_eq!(result, yaml("{a: [1, 9], b: 2}"));
    }

    #[test]
    fn test_failed_merge_leaves_empty_target() {
        let mut target = Value::Null;
        let result = merge(&mut target, yaml("!custom 3"));

        assert!(matches!(result, Err(ValueError::UnmergeableType(_))));
        assert_eq!(target, Value::Null);
    }

    #[test]
    fn test_unmergeable_source() {
        let mut target = yaml("{a: 1}");
        let result = merge(&mut target, yaml("!custom {b: 2}"));

        assert!(matches!(result, Err(ValueError::UnmergeableType(_))));
        assert_eq!(target, yaml("{a: 1}"));
    }
}
