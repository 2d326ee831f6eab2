//! JSON tree merge operations
//!
//! Ordered deep-merge of configuration layers with override semantics and a
//! modify pre-pass.
//!
//! ## Modify Directives
//!
//! A mapping inside a layer may carry these keys. They are applied to the
//! corresponding target node before the rest of that mapping is merged, and
//! they never appear in the merged result:
//!
//! - `__replace__`: replace the target wholesale (resolves shape conflicts)
//! - `__remove__`: remove listed values from an array target, or listed keys
//!   from a mapping target
//! - `__prepend__` / `__append__`: insert listed items at the start or end of
//!   an array target
//!
//! ## Example
//!
//! ```
//! use asset_composer::merge::merge;
//! use serde_json::json;
//!
//! let default = json!({"path": {"base": "./"}, "ignore": ["a"]});
//! let task = json!({"path": {"base": "./dev/"}, "ignore": ["b"]});
//! let merged = merge(&default, &[&task]).unwrap();
//! assert_eq!(merged["path"]["base"], "./dev/");
//! assert_eq!(merged["ignore"], json!(["b"]));
//! ```

use serde_json::{Map, Value};

use super::{KeyPath, PathSegment};
use crate::error::{Error, Result};

/// Replace the target node wholesale.
pub const REPLACE_DIRECTIVE: &str = "__replace__";
/// Remove values (array target) or keys (mapping target).
pub const REMOVE_DIRECTIVE: &str = "__remove__";
/// Insert items at the start of an array target.
pub const PREPEND_DIRECTIVE: &str = "__prepend__";
/// Insert items at the end of an array target.
pub const APPEND_DIRECTIVE: &str = "__append__";

/// Key name of comment entries stripped after composition.
pub const COMMENT_KEY: &str = "#";

/// Nesting depth beyond which merge input is treated as cyclic.
const MAX_MERGE_DEPTH: usize = 256;

fn is_directive(key: &str) -> bool {
    matches!(
        key,
        REPLACE_DIRECTIVE | REMOVE_DIRECTIVE | PREPEND_DIRECTIVE | APPEND_DIRECTIVE
    )
}

/// Merge `layers` in order onto a copy of `target`.
///
/// Neither `target` nor any layer is modified.
pub fn merge(target: &Value, layers: &[&Value]) -> Result<Value> {
    let mut merged = target.clone();
    for layer in layers {
        merge_into(&mut merged, layer)?;
    }
    Ok(merged)
}

/// Merge a single `layer` into `target` in place.
pub fn merge_into(target: &mut Value, layer: &Value) -> Result<()> {
    let mut path = KeyPath::root();
    merge_value(target, layer, &mut path, 0)
}

/// Copy `value` with all modify directives resolved against an empty target.
fn cleaned(value: &Value, path: &mut KeyPath, depth: usize) -> Result<Value> {
    let mut result = Value::Null;
    merge_value(&mut result, value, path, depth)?;
    Ok(result)
}

fn merge_value(target: &mut Value, source: &Value, path: &mut KeyPath, depth: usize) -> Result<()> {
    if depth > MAX_MERGE_DEPTH {
        return Err(Error::CyclicConfiguration {
            cycle: format!(
                "merge input nests deeper than {} levels at '{}'",
                MAX_MERGE_DEPTH, path
            ),
        });
    }

    match source {
        Value::Object(source_map) => merge_mapping(target, source_map, path, depth),
        Value::Array(items) => {
            if matches!(target, Value::Object(map) if !map.is_empty()) {
                return Err(Error::ConfigurationShape {
                    path: path.to_string(),
                    message: "cannot replace a mapping with an array; use __replace__".to_string(),
                });
            }
            let mut replacement = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                replacement.push(cleaned(item, path, depth + 1)?);
                path.pop();
            }
            *target = Value::Array(replacement);
            Ok(())
        }
        scalar => {
            *target = scalar.clone();
            Ok(())
        }
    }
}

fn merge_mapping(
    target: &mut Value,
    source: &Map<String, Value>,
    path: &mut KeyPath,
    depth: usize,
) -> Result<()> {
    let has_directives = source.keys().any(|key| is_directive(key));
    if has_directives {
        apply_directives(target, source, path, depth)?;
    }

    let mut remaining = source.iter().filter(|(key, _)| !is_directive(key)).peekable();
    if remaining.peek().is_none() {
        if !has_directives && !target.is_object() {
            *target = Value::Object(Map::new());
        }
        return Ok(());
    }

    match target {
        Value::Object(_) => {}
        Value::Array(items) if !items.is_empty() => {
            return Err(Error::ConfigurationShape {
                path: path.to_string(),
                message: "cannot merge a mapping into an array; use __replace__".to_string(),
            });
        }
        _ => *target = Value::Object(Map::new()),
    }

    if let Value::Object(target_map) = target {
        for (key, value) in remaining {
            path.push(PathSegment::Key(key.clone()));
            let slot = target_map.entry(key.clone()).or_insert(Value::Null);
            merge_value(slot, value, path, depth + 1)?;
            path.pop();
        }
    }
    Ok(())
}

fn apply_directives(
    target: &mut Value,
    source: &Map<String, Value>,
    path: &mut KeyPath,
    depth: usize,
) -> Result<()> {
    if let Some(replacement) = source.get(REPLACE_DIRECTIVE) {
        *target = cleaned(replacement, path, depth + 1)?;
    }

    if let Some(removals) = source.get(REMOVE_DIRECTIVE) {
        let removals: Vec<&Value> = match removals {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        match target {
            Value::Array(items) => items.retain(|item| !removals.contains(&item)),
            Value::Object(map) => {
                for key in removals.iter().filter_map(|removal| removal.as_str()) {
                    map.shift_remove(key);
                }
            }
            _ => {}
        }
    }

    for (directive, at_start) in [(PREPEND_DIRECTIVE, true), (APPEND_DIRECTIVE, false)] {
        let Some(additions) = source.get(directive) else {
            continue;
        };
        if target.is_null() {
            *target = Value::Array(Vec::new());
        }
        let Value::Array(items) = target else {
            return Err(Error::ConfigurationShape {
                path: path.to_string(),
                message: format!("{} requires an array target", directive),
            });
        };
        let additions = match additions {
            Value::Array(additions) => additions
                .iter()
                .map(|addition| cleaned(addition, path, depth + 1))
                .collect::<Result<Vec<_>>>()?,
            single => vec![cleaned(single, path, depth + 1)?],
        };
        if at_start {
            items.splice(0..0, additions);
        } else {
            items.extend(additions);
        }
    }

    Ok(())
}

/// Recursively remove comment entries (keys named `#`).
pub fn remove_comment_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.shift_remove(COMMENT_KEY);
            for child in map.values_mut() {
                remove_comment_keys(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(remove_comment_keys),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod override_semantics_tests {
        use super::*;

        #[test]
        fn test_later_layer_wins_on_scalars() {
            let default = json!({"path": {"base": "./"}});
            let debug = json!({"path": {"base": "./dev/"}});
            let merged = merge(&default, &[&debug]).unwrap();
            assert_eq!(merged["path"]["base"], json!("./dev/"));
        }

        #[test]
        fn test_arrays_replace_never_concatenate() {
            let default = json!({"ignore": ["a"]});
            let task = json!({"ignore": ["b"]});
            let merged = merge(&default, &[&task]).unwrap();
            assert_eq!(merged["ignore"], json!(["b"]));
        }

        #[test]
        fn test_mappings_merge_recursively() {
            let target = json!({"module": {"aliases": {"a": "b"}, "directoryNames": ["x"]}});
            let layer = json!({"module": {"aliases": {"c": "d"}}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["module"]["aliases"], json!({"a": "b", "c": "d"}));
            assert_eq!(merged["module"]["directoryNames"], json!(["x"]));
        }

        #[test]
        fn test_layers_are_left_untouched() {
            let target = json!({"a": {"b": 1}});
            let layer = json!({"a": {"c": {"__append__": [1]}}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(target, json!({"a": {"b": 1}}));
            assert_eq!(layer, json!({"a": {"c": {"__append__": [1]}}}));
            assert_eq!(merged, json!({"a": {"b": 1, "c": [1]}}));
        }

        #[test]
        fn test_key_order_is_preserved() {
            let target = json!({"z": 1, "a": 2});
            let layer = json!({"m": 3, "z": 4});
            let merged = merge(&target, &[&layer]).unwrap();
            let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
            assert_eq!(keys, vec!["z", "a", "m"]);
        }

        #[test]
        fn test_scalar_target_becomes_mapping() {
            let target = json!({"entry": "__auto__"});
            let layer = json!({"entry": {"index": "./a.js"}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["entry"], json!({"index": "./a.js"}));
        }

        #[test]
        fn test_null_overwrites() {
            let merged = merge(&json!({"a": {"b": 1}}), &[&json!({"a": null})]).unwrap();
            assert_eq!(merged["a"], Value::Null);
        }
    }

    mod shape_conflict_tests {
        use super::*;

        #[test]
        fn test_mapping_into_array_is_shape_error() {
            let target = json!({"entry": ["./a.js"]});
            let layer = json!({"entry": {"index": "./b.js"}});
            let error = merge(&target, &[&layer]).unwrap_err();
            match error {
                Error::ConfigurationShape { path, .. } => assert_eq!(path, "entry"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_array_onto_mapping_is_shape_error() {
            let target = json!({"a": {"b": 1}});
            let layer = json!({"a": [1]});
            assert!(matches!(
                merge(&target, &[&layer]),
                Err(Error::ConfigurationShape { .. })
            ));
        }

        #[test]
        fn test_replace_directive_resolves_shape_conflict() {
            let target = json!({"entry": ["./a.js"]});
            let layer = json!({"entry": {"__replace__": {"index": "./b.js"}}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["entry"], json!({"index": "./b.js"}));
        }

        #[test]
        fn test_replace_then_merge_remaining_keys() {
            let target = json!({"a": [1, 2]});
            let layer = json!({"a": {"__replace__": {}, "b": 1}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["a"], json!({"b": 1}));
        }
    }

    mod directive_tests {
        use super::*;

        #[test]
        fn test_append_and_prepend() {
            let target = json!({"ignore": ["b"]});
            let layer = json!({"ignore": {"__prepend__": ["a"], "__append__": "c"}});
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["ignore"], json!(["a", "b", "c"]));
        }

        #[test]
        fn test_append_to_missing_key_creates_array() {
            let merged = merge(&json!({}), &[&json!({"x": {"__append__": [1, 2]}})]).unwrap();
            assert_eq!(merged["x"], json!([1, 2]));
        }

        #[test]
        fn test_append_to_scalar_is_shape_error() {
            let result = merge(&json!({"x": 1}), &[&json!({"x": {"__append__": [2]}})]);
            assert!(matches!(result, Err(Error::ConfigurationShape { .. })));
        }

        #[test]
        fn test_remove_from_array_and_mapping() {
            let target = json!({"list": ["a", "b", "a", "c"], "map": {"a": 1, "b": 2}});
            let layer = json!({
                "list": {"__remove__": "a"},
                "map": {"__remove__": ["b"], "c": 3}
            });
            let merged = merge(&target, &[&layer]).unwrap();
            assert_eq!(merged["list"], json!(["b", "c"]));
            assert_eq!(merged["map"], json!({"a": 1, "c": 3}));
        }

        #[test]
        fn test_directives_never_leak_into_result() {
            let layer = json!({
                "a": {"__append__": [{"b": {"__replace__": 1}}]},
                "c": [{"d": {"__prepend__": ["x"]}}]
            });
            let merged = merge(&json!({}), &[&layer]).unwrap();
            assert_eq!(merged, json!({"a": [{"b": 1}], "c": [{"d": ["x"]}]}));
            assert!(!serde_json::to_string(&merged).unwrap().contains("__"));
        }
    }

    mod depth_tests {
        use super::*;

        #[test]
        fn test_pathologically_deep_input_is_cyclic_error() {
            let mut deep = json!(1);
            for _ in 0..(MAX_MERGE_DEPTH + 5) {
                deep = json!({ "n": deep });
            }
            assert!(matches!(
                merge(&json!({}), &[&deep]),
                Err(Error::CyclicConfiguration { .. })
            ));
        }
    }

    mod comment_key_tests {
        use super::*;

        #[test]
        fn test_remove_comment_keys_recursively() {
            let mut value = json!({
                "#": "top",
                "a": {"#": "nested", "b": 1},
                "c": [{"#": "in array", "d": 2}]
            });
            remove_comment_keys(&mut value);
            assert_eq!(value, json!({"a": {"b": 1}, "c": [{"d": 2}]}));
        }
    }
}
