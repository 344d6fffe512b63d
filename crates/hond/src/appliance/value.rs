//! Tree-shaped attribute model for appliance data.
//!
//! Appliance dumps are nested JSON objects. Entity descriptions address
//! values inside them with dotted key paths such as
//! `attributes.lastConnEvent.category`.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Failure to resolve a dotted key path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("empty attribute path")]
    EmptyPath,

    #[error("attribute path '{path}': key '{segment}' not found")]
    Missing { path: String, segment: String },

    #[error("attribute path '{path}': cannot index '{segment}' into a non-object value")]
    NotAnObject { path: String, segment: String },
}

/// Nested appliance attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTree(Value);

impl AttributeTree {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Resolve a dotted key path against the root of the tree.
    pub fn lookup(&self, path: &str) -> Result<&Value, LookupError> {
        if path.is_empty() {
            return Err(LookupError::EmptyPath);
        }

        let mut current = &self.0;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment).ok_or_else(|| LookupError::Missing {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?,
                _ => {
                    return Err(LookupError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            };
        }

        Ok(current)
    }

    /// Appliance-style attribute access.
    ///
    /// Dotted keys resolve from the root. Bare keys are looked up at the
    /// root first, then inside `attributes.parameters`, where the appliance
    /// reports its live status.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key.contains('.') {
            return self.lookup(key).ok();
        }
        self.0.get(key).or_else(|| {
            self.0
                .get("attributes")
                .and_then(|attributes| attributes.get("parameters"))
                .and_then(|parameters| parameters.get(key))
        })
    }

    /// Like [`AttributeTree::get`], rendered as a string, with a default.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(render)
            .unwrap_or_else(|| default.to_string())
    }
}

impl From<Value> for AttributeTree {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Render a scalar as the appliance would report it.
///
/// Strings are returned without quotes so that `"1"` and `1` compare equal.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tree() -> AttributeTree {
        AttributeTree::new(json!({
            "attributes": {
                "lastConnEvent": { "category": "CONNECTED" },
                "parameters": { "remoteCtrValid": "1", "machMode": 2 },
            },
            "brand": "haier",
        }))
    }

    #[test]
    fn test_lookup_nested() {
        let tree = tree();
        assert_eq!(
            tree.lookup("attributes.lastConnEvent.category").unwrap(),
            &json!("CONNECTED")
        );
    }

    #[test]
    fn test_lookup_missing_names_segment() {
        let err = tree().lookup("attributes.nope.category").unwrap_err();
        assert_eq!(
            err,
            LookupError::Missing {
                path: "attributes.nope.category".to_string(),
                segment: "nope".to_string(),
            }
        );
    }

    #[test]
    fn test_lookup_through_scalar() {
        let err = tree().lookup("brand.name").unwrap_err();
        assert!(matches!(err, LookupError::NotAnObject { ref segment, .. } if segment == "name"));
    }

    #[test]
    fn test_lookup_empty_path() {
        assert_eq!(tree().lookup(""), Err(LookupError::EmptyPath));
    }

    #[test]
    fn test_bare_keys_resolve_at_root_then_parameters() {
        let tree = tree();
        assert_eq!(tree.get("machMode"), Some(&json!(2)));
        assert_eq!(tree.get("brand"), Some(&json!("haier")));
        assert_eq!(tree.get_or("remoteCtrValid", "0"), "1");
        assert_eq!(tree.get_or("fwVersion", ""), "");
    }

    #[test]
    fn test_root_key_shadows_parameter() {
        let tree = AttributeTree::new(json!({
            "prCode": 7,
            "attributes": { "parameters": { "prCode": 3 } },
        }));
        assert_eq!(tree.get("prCode"), Some(&json!(7)));
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&json!("1")), "1");
        assert_eq!(render(&json!(1)), "1");
        assert_eq!(render(&json!(null)), "");
        assert_eq!(render(&json!(true)), "true");
    }
}
