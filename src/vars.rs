//! Per-session variable bindings.
//!
//! A [`VariableStore`] is created when a session starts, mutated only by
//! `set_variable` executors and input-node reply binding, and dropped when the
//! session reaches a terminal state. Sessions never share a store, so two
//! concurrently running sessions can never observe each other's mutations.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

/// String key/value bindings scoped to one session.
///
/// All values are strings: numeric and phone inputs are stored as their
/// literal reply text, and interpolation always produces string output.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    bindings: FxHashMap<String, String>,
}

impl VariableStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a binding, returning `None` when the name is unbound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Looks up a binding, defaulting to the empty string when unbound.
    ///
    /// This is the interpolation contract: unbound names never fail, they
    /// resolve to `""`.
    #[must_use]
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Binds `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Exports the bindings in deterministic (sorted) order.
    ///
    /// Used for the final-variables payload of a completed session, where
    /// stable ordering keeps serialized output reproducible.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
