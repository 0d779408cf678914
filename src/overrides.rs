//! Convert `--set` assignments into a nested [`ValueTree`].
//!
//! Each raw string may hold several comma-separated `key=value` pairs. Keys are
//! dotted paths (`app.name=web` becomes `{app = {name = "web"}}`) and values are
//! type-inferred: booleans, then integers, then floats, then strings.

use tracing::debug;

use crate::error::TemplaterError;
use crate::value::{Value, ValueTree};

/// Parse `--set` style assignments into a nested tree.
///
/// Later assignments to the same key win. A segment without `=` is an
/// [`InvalidOverride`](TemplaterError::InvalidOverride); a dotted key that
/// passes through an existing non-map value is an
/// [`OverrideConflict`](TemplaterError::OverrideConflict).
pub fn parse_set_values<S: AsRef<str>>(raw: &[S]) -> Result<ValueTree, TemplaterError> {
    let mut tree = ValueTree::new();

    for entry in raw {
        for pair in entry.as_ref().split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let Some((key, value)) = pair.split_once('=') else {
                return Err(TemplaterError::InvalidOverride {
                    entry: pair.to_string(),
                });
            };

            let key = key.trim();
            let value = infer_value(value.trim());
            debug!("--set {key} = {value:?}");
            set_nested(&mut tree, key, value)?;
        }
    }

    Ok(tree)
}

/// Infer the type of a `--set` value.
///
/// `true`/`false` in any case → bool, then base-10 integer, then finite
/// float, otherwise the string itself. `inf`, `Infinity` and `NaN` stay
/// strings since they have no representation in the rendered data.
pub fn infer_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>()
        && f.is_finite()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}

/// Write `value` at `dotted_key`, creating intermediate maps as needed.
///
/// Fails without modifying the existing leaf when an intermediate segment
/// already holds something other than a map.
pub fn set_nested(
    tree: &mut ValueTree,
    dotted_key: &str,
    value: Value,
) -> Result<(), TemplaterError> {
    let (parents, leaf) = match dotted_key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, dotted_key),
    };

    let mut current = tree;
    let mut walked = String::new();
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);

        current = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Tree(ValueTree::new()))
            .as_tree_mut()
            .ok_or_else(|| TemplaterError::OverrideConflict {
                key: dotted_key.to_string(),
                segment: walked.clone(),
            })?;
    }

    current.insert(leaf.to_string(), value);
    Ok(())
}
