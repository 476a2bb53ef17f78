//! Named-stack store.
//!
//! A map from variable name to an independent LIFO stack of values.  `FOR`
//! loops push their induction variable here so a nested loop over the same
//! name shadows the outer one and restores it on exit.

use std::collections::HashMap;

use thiserror::Error;

use super::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("no stack named `{0}`")]
    Unknown(String),
    #[error("stack `{0}` is empty")]
    Empty(String),
}

#[derive(Debug, Default)]
pub struct StackStore {
    stacks: HashMap<String, Vec<Value>>,
}

impl StackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `value` onto the stack called `name`, creating it if needed.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.stacks.entry(name.into()).or_default().push(value);
    }

    /// Remove and return the top of `name`'s stack.
    ///
    /// The name stays known after its last entry is popped, so popping again
    /// reports [`StackError::Empty`] rather than [`StackError::Unknown`].
    pub fn pop(&mut self, name: &str) -> Result<Value, StackError> {
        self.stack_mut(name)?
            .pop()
            .ok_or_else(|| StackError::Empty(name.to_owned()))
    }

    /// The top of `name`'s stack, left in place.
    pub fn peek(&self, name: &str) -> Result<&Value, StackError> {
        self.stack(name)?
            .last()
            .ok_or_else(|| StackError::Empty(name.to_owned()))
    }

    /// Mutable access to the top of `name`'s stack, for in-place updates.
    pub fn peek_mut(&mut self, name: &str) -> Result<&mut Value, StackError> {
        self.stack_mut(name)?
            .last_mut()
            .ok_or_else(|| StackError::Empty(name.to_owned()))
    }

    pub fn is_empty(&self, name: &str) -> Result<bool, StackError> {
        Ok(self.stack(name)?.is_empty())
    }

    /// The top of `name`'s stack, or `None` for unknown or empty names.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.stacks.get(name)?.last()
    }

    /// Number of live entries under `name` (0 for unknown names).
    pub fn depth(&self, name: &str) -> usize {
        self.stacks.get(name).map_or(0, Vec::len)
    }

    fn stack(&self, name: &str) -> Result<&Vec<Value>, StackError> {
        self.stacks
            .get(name)
            .ok_or_else(|| StackError::Unknown(name.to_owned()))
    }

    fn stack_mut(&mut self, name: &str) -> Result<&mut Vec<Value>, StackError> {
        self.stacks
            .get_mut(name)
            .ok_or_else(|| StackError::Unknown(name.to_owned()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
