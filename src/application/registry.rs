//! Registry of built models, newest first.

use std::collections::VecDeque;

use tracing::debug;

/// Result of removing a batch of models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub removed: Vec<String>,
    /// Names that were not registered
    pub missing: Vec<String>,
}

/// Insertion-ordered map of model name to view. The newest entry comes first.
#[derive(Debug)]
pub struct ModelRegistry<T> {
    entries: VecDeque<(String, T)>,
}

impl<T> Default for ModelRegistry<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> ModelRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Register `build()` under `name` unless it already exists.
    ///
    /// Returns whether a new entry was created. `build` only runs for new names.
    pub fn insert_with<E>(
        &mut self,
        name: &str,
        build: impl FnOnce() -> Result<T, E>,
    ) -> Result<bool, E> {
        if self.contains(name) {
            debug!("model {} already registered", name);
            return Ok(false);
        }
        let view = build()?;
        self.entries.push_front((name.to_string(), view));
        Ok(true)
    }

    pub fn insert_if_absent(&mut self, name: &str, view: T) -> bool {
        matches!(
            self.insert_with::<std::convert::Infallible>(name, || Ok(view)),
            Ok(true)
        )
    }

    /// Remove every named model; unknown names are reported, not fatal.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) -> RemovalOutcome {
        let mut outcome = RemovalOutcome::default();
        for name in names.iter().map(AsRef::as_ref) {
            match self.entries.iter().position(|(n, _)| n == name) {
                Some(pos) => {
                    self.entries.remove(pos);
                    outcome.removed.push(name.to_string());
                }
                None => outcome.missing.push(name.to_string()),
            }
        }
        outcome
    }

    /// Labels in display order (newest first).
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Views whose label positions are active; out-of-range indices are skipped.
    pub fn select(&self, active: &[usize]) -> Vec<(&str, &T)> {
        active
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .map(|(n, v)| (n.as_str(), v))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
