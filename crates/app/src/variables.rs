//! Shared handle on an engine's [`VariableStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use codematic_domain::value::Scalar;
use codematic_domain::variables::VariableStore;

/// Cheaply cloneable handle on one engine's variables.
///
/// Every operation takes the lock for its own duration only, so concurrent
/// chains interleave at operation granularity and the last write wins.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    store: Arc<Mutex<VariableStore>>,
}

impl Variables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VariableStore> {
        // A panicking handler cannot leave the store half-written: every
        // mutation is a single Vec operation.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.lock().set(key, value);
    }

    /// Store `value` if it is a string or a number. Returns whether it was
    /// stored.
    pub fn set_value(&self, key: impl Into<String>, value: &Value) -> bool {
        self.lock().set_value(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Scalar> {
        self.lock().get(key).cloned()
    }

    /// `get(key)` rendered as text.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(ToString::to_string)
    }

    #[must_use]
    pub fn code(&self) -> String {
        self.lock().code()
    }

    pub fn clear(&self, key: Option<&str>) {
        self.lock().clear(key);
    }

    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        self.lock().substitute(text)
    }

    /// Substitute with each value passed through `render`.
    #[must_use]
    pub fn substitute_with(&self, text: &str, render: impl Fn(&Scalar) -> String) -> String {
        self.lock().substitute_with(text, render)
    }

    #[must_use]
    pub fn substitute_value(&self, value: Value) -> Value {
        self.lock().substitute_value(value)
    }
}
