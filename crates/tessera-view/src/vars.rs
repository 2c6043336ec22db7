//! Template variables and the builder for them

use crate::error::{Result, ViewError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Variables handed to a template
pub type Vars = Map<String, Value>;

/// Builder for constructing template variables
///
/// This provides a fluent API for building variables without
/// needing to create a struct for simple cases. The first value that fails
/// to serialize is reported by [`build`](VarsBuilder::build).
///
/// # Example
///
/// ```rust
/// use tessera_view::VarsBuilder;
///
/// let is_admin = false;
/// let vars = VarsBuilder::new()
///     .insert("name", &"Alice")
///     .insert("age", &30)
///     .insert_if("admin", &true, |_| is_admin)
///     .build()?;
///
/// assert_eq!(vars.len(), 2);
/// # Ok::<(), tessera_view::ViewError>(())
/// ```
#[derive(Debug, Default)]
pub struct VarsBuilder {
    vars: Vars,
    error: Option<ViewError>,
}

impl VarsBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value
    pub fn insert<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_value(value) {
            Ok(value) => {
                self.vars.insert(key.into(), value);
            }
            Err(e) => {
                let key = key.into();
                self.error = Some(ViewError::serialization_error(format!("{}: {}", key, e)));
            }
        }
        self
    }

    /// Insert a value if a condition is met
    pub fn insert_if<T: Serialize + ?Sized, F>(
        self,
        key: impl Into<String>,
        value: &T,
        condition: F,
    ) -> Self
    where
        F: FnOnce(&T) -> bool,
    {
        if condition(value) {
            self.insert(key, value)
        } else {
            self
        }
    }

    /// Insert a value if it's Some
    pub fn insert_some<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: Option<&T>,
    ) -> Self {
        if let Some(v) = value {
            self.insert(key, v)
        } else {
            self
        }
    }

    /// Extend with the fields of a serializable struct
    ///
    /// # Errors
    ///
    /// Fails if `value` does not serialize to a map.
    pub fn extend<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.vars.extend(to_vars(value)?);
        Ok(self)
    }

    /// Build the variables
    ///
    /// # Errors
    ///
    /// Returns the error of the first inserted value that failed to serialize.
    pub fn build(self) -> Result<Vars> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.vars),
        }
    }
}

impl TryFrom<VarsBuilder> for Vars {
    type Error = ViewError;

    fn try_from(builder: VarsBuilder) -> Result<Self> {
        builder.build()
    }
}

/// Serialize a struct or map into [`Vars`]
pub fn to_vars<T: Serialize + ?Sized>(value: &T) -> Result<Vars> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Vars::new()),
        other => Err(ViewError::serialization_error(format!(
            "template variables must serialize to a map, got {}",
            kind_of(&other)
        ))),
    }
}

/// Merge variable layers, later layers overriding earlier ones
pub fn merge_vars<'a>(layers: impl IntoIterator<Item = &'a Vars>) -> Vars {
    let mut merged = Vars::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Merge `incoming` into `target`, combining maps and arrays instead of replacing them
///
/// Two maps merge key by key; an array absorbs the other side's elements;
/// two scalars under the same key become a two-element array.
pub fn merge_recursive(target: &mut Vars, incoming: Vars) {
    for (key, value) in incoming {
        match target.remove(&key) {
            None => {
                target.insert(key, value);
            }
            Some(existing) => {
                target.insert(key, combine(existing, value));
            }
        }
    }
}

fn combine(existing: Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(mut left), Value::Object(right)) => {
            merge_recursive(&mut left, right);
            Value::Object(left)
        }
        (Value::Array(mut left), Value::Array(right)) => {
            left.extend(right);
            Value::Array(left)
        }
        (Value::Array(mut left), right) => {
            left.push(right);
            Value::Array(left)
        }
        (left, Value::Array(right)) => {
            let mut items = vec![left];
            items.extend(right);
            Value::Array(items)
        }
        (left, right) => Value::Array(vec![left, right]),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Vars {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_vars_builder() {
        let vars = VarsBuilder::new()
            .insert("name", &"Alice")
            .insert("age", &30)
            .build()
            .unwrap();

        assert_eq!(vars.get("name"), Some(&json!("Alice")));
        assert_eq!(vars.get("age"), Some(&json!(30)));
    }

    #[test]
    fn test_insert_if() {
        let show = true;
        let vars = VarsBuilder::new()
            .insert_if("visible", &"yes", |_| show)
            .insert_if("hidden", &"no", |_| !show)
            .build()
            .unwrap();

        assert!(vars.contains_key("visible"));
        assert!(!vars.contains_key("hidden"));
    }

    #[test]
    fn test_insert_some() {
        let name: Option<&str> = Some("Alice");
        let missing: Option<&str> = None;

        let vars = VarsBuilder::new()
            .insert_some("name", name)
            .insert_some("missing", missing)
            .build()
            .unwrap();

        assert!(vars.contains_key("name"));
        assert!(!vars.contains_key("missing"));
    }

    #[test]
    fn test_extend_from_struct() {
        #[derive(Serialize)]
        struct Page {
            title: String,
        }

        let vars = VarsBuilder::new()
            .extend(&Page {
                title: "Home".to_string(),
            })
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(vars.get("title"), Some(&json!("Home")));
    }

    #[test]
    fn test_serialization_failure_is_reported() {
        // JSON object keys must be strings
        let mut by_pair = std::collections::HashMap::new();
        by_pair.insert((1, 2), "pair");

        let err = VarsBuilder::new()
            .insert("ok", &1)
            .insert("by_pair", &by_pair)
            .insert("later", &2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ViewError::Serialization(msg) if msg.starts_with("by_pair")));
    }

    #[test]
    fn test_to_vars_rejects_scalars() {
        assert!(to_vars(&42).is_err());
        assert!(to_vars(&()).unwrap().is_empty());
    }

    #[test]
    fn test_merge_later_layer_wins() {
        let bag = vars(json!({"a": 1, "b": 1}));
        let explicit = vars(json!({"b": 2, "c": 3}));

        let merged = merge_vars([&bag, &explicit]);
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2, "c": 3}));
    }

    #[test]
    fn test_merge_recursive() {
        let mut target = vars(json!({"menu": {"home": "/"}, "tags": ["a"], "title": "x"}));
        merge_recursive(
            &mut target,
            vars(json!({"menu": {"about": "/about"}, "tags": ["b"], "title": "y"})),
        );

        assert_eq!(
            Value::Object(target),
            json!({
                "menu": {"home": "/", "about": "/about"},
                "tags": ["a", "b"],
                "title": ["x", "y"]
            })
        );
    }
}
