use crate::OperatorError;
use crate::value::Value;

/// Stack of value stacks
///
/// The current stack is held apart from its parents, so there is always at
/// least one stack and closing the outermost one is reported rather than
/// silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeStack {
    current: Vec<Value>,
    parents: Vec<Vec<Value>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the current stack, bottom first
    pub fn current(&self) -> &[Value] {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Vec<Value> {
        &mut self.current
    }

    /// Number of stacks, including the current one
    pub fn depth(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn push(&mut self, value: Value) {
        self.current.push(value);
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.current.extend(values);
    }

    /// Swap in `values` as the current stack, returning the old contents
    pub fn replace_current(&mut self, values: Vec<Value>) -> Vec<Value> {
        std::mem::replace(&mut self.current, values)
    }

    /// Start a fresh empty stack on top
    pub fn open(&mut self) {
        let parent = std::mem::take(&mut self.current);
        self.parents.push(parent);
    }

    /// Drop back to the parent stack, handing back what the closed stack held
    pub fn close(&mut self) -> Result<Vec<Value>, OperatorError> {
        match self.parents.pop() {
            Some(parent) => Ok(std::mem::replace(&mut self.current, parent)),
            None => Err(OperatorError::ScopeUnderflow),
        }
    }
}
