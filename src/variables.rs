//! Registry of variable observations.
//!
//! Every lookup against a resolved configuration records a [`Variable`]:
//! the requested name, what it resolved to, and whether a fallback was
//! involved. Observations are grouped by name in first-seen order so tests
//! and tooling can inspect which variables a program actually read.
//!
//! The process-wide registry is created on first use and lives until the
//! process exits; it is never reset. Tests that need isolation create their
//! own registry with [`VariableRegistry::new`] and hand it to the resolver.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single lookup observation.
///
/// `value`/`fallback` are absent when undefined and the two flags are
/// absent when false, so a present field always carries information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub has_fallback: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub uses_fallback: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Option<Value>, fallback: Option<Value>) -> Self {
        let has_fallback = fallback.is_some();
        Self {
            name: name.into(),
            value,
            fallback,
            has_fallback,
            uses_fallback: false,
        }
    }

    pub fn using_fallback(mut self, uses_fallback: bool) -> Self {
        self.uses_fallback = uses_fallback && self.has_fallback;
        self
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Name groups in first-seen order.
    order: Vec<String>,
    groups: HashMap<String, Vec<Arc<Variable>>>,
    count: usize,
}

/// Memoizing store of [`Variable`] observations.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    state: Mutex<RegistryState>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry shared by resolvers that are not given one.
    pub fn global() -> Arc<VariableRegistry> {
        static GLOBAL: OnceLock<Arc<VariableRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(VariableRegistry::new())))
    }

    /// Record an observation, returning the cached instance when an
    /// identical record was already created.
    pub fn create(&self, variable: Variable) -> Arc<Variable> {
        let mut state = self.lock();

        if let Some(existing) = state
            .groups
            .get(&variable.name)
            .and_then(|group| group.iter().find(|v| ***v == variable))
        {
            return Arc::clone(existing);
        }

        let name = variable.name.clone();
        let variable = Arc::new(variable);
        if !state.groups.contains_key(&name) {
            state.order.push(name.clone());
        }
        state
            .groups
            .entry(name)
            .or_default()
            .push(Arc::clone(&variable));
        state.count += 1;
        variable
    }

    /// Total number of distinct observations across all names.
    pub fn count(&self) -> usize {
        self.lock().count
    }

    /// Observations recorded for `name`, oldest first.
    pub fn get(&self, name: &str) -> Vec<Arc<Variable>> {
        self.lock().groups.get(name).cloned().unwrap_or_default()
    }

    /// Names that have at least one observation, in first-seen order.
    pub fn names(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// Copy of every group in first-seen order.
    pub fn snapshot(&self) -> Vec<(String, Vec<Arc<Variable>>)> {
        let state = self.lock();
        state
            .order
            .iter()
            .map(|name| (name.clone(), state.groups.get(name).cloned().unwrap_or_default()))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn total(registry: &VariableRegistry) -> usize {
        registry.snapshot().iter().map(|(_, group)| group.len()).sum()
    }

    #[test]
    fn test_identical_records_are_cached() {
        let registry = VariableRegistry::new();
        let a = registry.create(Variable::new("A", Some(json!("x")), None));
        let b = registry.create(Variable::new("A", Some(json!("x")), None));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get("A").len(), 1);
    }

    #[test]
    fn test_distinct_records_group_by_name() {
        let registry = VariableRegistry::new();
        registry.create(Variable::new("A", Some(json!(1)), None));
        registry.create(Variable::new("A", Some(json!(2)), None));
        registry.create(Variable::new("B", None, Some(json!("fb"))).using_fallback(true));
        registry.create(Variable::new("A", Some(json!(1)), Some(json!(0))));

        assert_eq!(registry.names(), vec!["A", "B"]);
        assert_eq!(registry.get("A").len(), 3);
        assert_eq!(registry.count(), 4);
        assert_eq!(total(&registry), registry.count());
    }

    #[test]
    fn test_compact_serialization() {
        let bare = Variable::new("A", None, None);
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({"name": "A"}));

        let with_fallback = Variable::new("B", Some(json!("fb")), Some(json!("fb"))).using_fallback(true);
        assert_eq!(
            serde_json::to_value(&with_fallback).unwrap(),
            json!({
                "name": "B",
                "value": "fb",
                "fallback": "fb",
                "hasFallback": true,
                "usesFallback": true
            })
        );
    }

    #[test]
    fn test_uses_fallback_requires_fallback() {
        let v = Variable::new("A", None, None).using_fallback(true);
        assert!(!v.uses_fallback);
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = VariableRegistry::global();
        let b = VariableRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
