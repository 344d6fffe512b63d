use std::collections::BTreeMap;
use std::collections::HashSet;

use serde_json::Value;

use super::description::EntityDescription;

/// Combine two description tables, keyed by description key.
///
/// Every entry of `base` is kept in order. Entries of `new` are appended in
/// their own order unless their key is already present.
pub fn unique_entities<D>(base: &[D], new: &[D]) -> Vec<D>
where
    D: EntityDescription + Clone,
{
    let mut seen: HashSet<&str> = base.iter().map(|d| d.key()).collect();
    let mut result = base.to_vec();
    for description in new {
        if seen.insert(description.key()) {
            result.push(description.clone());
        }
    }
    result
}

/// Resolve a raw appliance value through an optional label table.
///
/// The value is returned unchanged when there is no table, when it does not
/// convert to an integer, or when the integer has no label.
pub fn readable(option_list: Option<&BTreeMap<i64, &'static str>>, value: &Value) -> Value {
    let Some(options) = option_list else {
        return value.clone();
    };

    as_integer(value)
        .and_then(|n| options.get(&n))
        .map(|label| Value::String(label.to_string()))
        .unwrap_or_else(|| value.clone())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
