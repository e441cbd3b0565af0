use constraint_types::{Constraint, ConstraintKey};
use std::collections::BTreeMap;

/// Constraints keyed by `(kind, name)`. Iteration is in key order.
#[derive(Clone, Debug, Default)]
pub struct ConstraintStore {
    by_key: BTreeMap<ConstraintKey, Constraint>,
}

impl ConstraintStore {
    pub fn get(&self, kind: &str, name: &str) -> Option<&Constraint> {
        self.by_key.get(&ConstraintKey {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }

    /// Insert or replace. Returns the previous constraint under the same key.
    pub fn insert(&mut self, constraint: Constraint) -> Option<Constraint> {
        self.by_key.insert(constraint.key(), constraint)
    }

    pub fn remove(&mut self, key: &ConstraintKey) -> Option<Constraint> {
        self.by_key.remove(key)
    }

    /// Remove every constraint of `kind`; returns their keys in order.
    pub fn remove_kind(&mut self, kind: &str) -> Vec<ConstraintKey> {
        let keys: Vec<ConstraintKey> = self.of_kind(kind).map(Constraint::key).collect();
        for key in &keys {
            self.by_key.remove(key);
        }
        keys
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.by_key
            .iter()
            .filter(move |(k, _)| k.kind == kind)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.by_key.values()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
