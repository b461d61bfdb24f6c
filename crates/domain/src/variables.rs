//! Variable store — the scalar register shared by every action of an engine.
//!
//! Actions pass data to each other through named variables, and any string
//! parameter may reference a variable as `%NAME%`.

use serde_json::Value;

use crate::value::Scalar;

/// Current trigger input.
pub const CODE: &str = "CODE";
/// Firing time of the current schedule, RFC 3339.
pub const DATE: &str = "DATE";
/// Path of the file that changed.
pub const FILENAME: &str = "FILENAME";
/// Default target of `exec` and `request`.
pub const RESPONSE: &str = "RESPONSE";
/// Body of the last HTTP response.
pub const BODY: &str = "BODY";
/// Prefix of HTTP response metadata variables.
pub const RESPONSE_PREFIX: &str = "RESPONSE_";
/// Description of the last captured runtime error.
pub const ERROR: &str = "ERROR";
/// Default target of `readfile`.
pub const FILE: &str = "FILE";

/// Insertion-ordered mapping from case-sensitive names to [`Scalar`]s.
///
/// Overwriting a key keeps its first position, so substitution order is
/// stable across updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    entries: Vec<(String, Scalar)>,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Store `value` only if it is a string or a number.
    ///
    /// Returns whether the value was stored. Anything else is dropped and
    /// the previous value, if any, is kept.
    pub fn set_value(&mut self, key: impl Into<String>, value: &Value) -> bool {
        match Scalar::from_value(value) {
            Some(scalar) => {
                self.set(key, scalar);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The current trigger input, or an empty string when none was set.
    #[must_use]
    pub fn code(&self) -> String {
        self.get(CODE).map(ToString::to_string).unwrap_or_default()
    }

    /// Remove `key`, or every variable when `key` is `None`.
    pub fn clear(&mut self, key: Option<&str>) {
        match key {
            Some(key) => self.entries.retain(|(k, _)| k != key),
            None => self.entries.clear(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace the first `%KEY%` token of every stored key.
    ///
    /// Keys are visited in insertion order. Tokens are located in the
    /// input text only; text produced by a substitution is never scanned
    /// again, and a token overlapping an earlier replacement is skipped in
    /// favour of its next occurrence.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        self.substitute_with(text, ToString::to_string)
    }

    /// Like [`substitute`](Self::substitute), rendering each value through
    /// `render` first.
    #[must_use]
    pub fn substitute_with(&self, text: &str, render: impl Fn(&Scalar) -> String) -> String {
        let mut spans: Vec<(usize, usize, String)> = Vec::new();

        for (key, value) in &self.entries {
            let token = format!("%{key}%");
            let free = text
                .match_indices(token.as_str())
                .map(|(start, _)| (start, start + token.len()))
                .find(|&(start, end)| spans.iter().all(|&(s, e, _)| end <= s || start >= e));
            if let Some((start, end)) = free {
                spans.push((start, end, render(value)));
            }
        }

        if spans.is_empty() {
            return text.to_string();
        }

        spans.sort_by_key(|&(start, _, _)| start);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (start, end, replacement) in spans {
            out.push_str(&text[cursor..start]);
            out.push_str(&replacement);
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Substitute every string leaf of a structured value.
    ///
    /// Walks the tree with an explicit stack so deeply nested input cannot
    /// exhaust the call stack. Keys of objects are left untouched.
    #[must_use]
    pub fn substitute_value(&self, mut value: Value) -> Value {
        let mut stack = vec![&mut value];
        while let Some(node) = stack.pop() {
            match node {
                Value::String(s) => *s = self.substitute(s),
                Value::Array(items) => stack.extend(items.iter_mut()),
                Value::Object(map) => stack.extend(map.values_mut()),
                Value::Null | Value::Bool(_) | Value::Number(_) => {}
            }
        }
        value
    }
}
