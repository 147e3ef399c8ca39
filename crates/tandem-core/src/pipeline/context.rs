//! Accumulating run state passed between pipeline steps.

use serde_json::{Map, Value};

/// One mutable key/value mapping owned exclusively by a single in-flight
/// run. Seeded from the caller's input payload; each step reads a
/// projection of it and writes its output under the step's merge key.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    values: Map<String, Value>,
}

impl WorkflowContext {
    /// Seed a context from the caller's input payload. Object fields become
    /// top-level keys; any other payload is stored under `"input"`.
    pub fn from_input(input: Value) -> Self {
        let values = match input {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// The full context as a JSON object. This is the default step
    /// projection when a step declares no narrower one.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_input_seeds_top_level_keys() {
        let ctx = WorkflowContext::from_input(json!({
            "customer_id": "12345",
            "inquiry": "I want to reduce my electricity bill"
        }));
        assert_eq!(ctx.get("customer_id"), Some(&json!("12345")));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn scalar_input_lands_under_input_key() {
        let ctx = WorkflowContext::from_input(json!("just a string"));
        assert_eq!(ctx.get("input"), Some(&json!("just a string")));

        let empty = WorkflowContext::from_input(Value::Null);
        assert_eq!(empty.snapshot(), json!({}));
    }

    #[test]
    fn insert_overwrites_and_snapshot_reflects_state() {
        let mut ctx = WorkflowContext::from_input(json!({"a": 1}));
        ctx.insert("b", json!({"nested": true}));
        ctx.insert("a", json!(2));
        assert_eq!(ctx.snapshot(), json!({"a": 2, "b": {"nested": true}}));
    }
}
