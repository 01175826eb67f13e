use crate::OperatorError;
use crate::value::Value;
use std::collections::HashMap;

/// Global variable bindings, written by `set` and read by `get`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key`, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.bindings.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Result<&Value, OperatorError> {
        self.bindings
            .get(key)
            .ok_or_else(|| OperatorError::UnboundVariable(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings sorted by name
    pub fn iter_sorted(&self) -> Vec<(&str, &Value)> {
        let mut entries: Vec<_> = self
            .bindings
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
