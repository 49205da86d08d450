//! Stage input descriptor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Describes one unit of work handed to a stage invocation.
///
/// Owned by the aggregator for the duration of the invocation and not
/// retained afterwards. The params are opaque to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInput {
    /// Identifier for this unit of work; also used as the event scope for
    /// per-item stage invocations.
    pub id: String,
    /// Arbitrary task parameters.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl StageInput {
    /// Creates an input with no parameters.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// Looks up a string parameter.
    #[must_use]
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_params() {
        let input = StageInput::new("step_1")
            .with_param("step", serde_json::json!(1))
            .with_param("prompt", serde_json::json!("hi1"));

        assert_eq!(input.param("step"), Some(&serde_json::json!(1)));
        assert_eq!(input.str_param("prompt"), Some("hi1"));
        assert_eq!(input.str_param("step"), None);
        assert_eq!(input.param("missing"), None);
    }

    #[test]
    fn test_input_serde() {
        let input = StageInput::new("step_2").with_param("action", serde_json::json!("step_2"));
        let json = serde_json::to_string(&input).expect("input should serialize");
        let back: StageInput = serde_json::from_str(&json).expect("input should deserialize");
        assert_eq!(input, back);
    }
}
