use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

/// A stored reference object and the targets it was resolved to when added.
#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    pub object: JsonValue,
    pub targets: BTreeSet<String>,
}

/// Reference objects in insertion order. Duplicates are independent entries.
#[derive(Clone, Debug, Default)]
pub struct DataStore {
    entries: Vec<DataEntry>,
}

impl DataStore {
    pub fn push(&mut self, object: JsonValue, targets: BTreeSet<String>) {
        self.entries.push(DataEntry { object, targets });
    }

    /// Remove every entry structurally equal to `object`; returns how many were removed.
    pub fn remove_equal(&mut self, object: &JsonValue) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| &e.object != object);
        before - self.entries.len()
    }

    pub fn all_for_target<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = &'a JsonValue> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.targets.contains(target))
            .map(|e| &e.object)
    }

    /// Targets with at least one stored object.
    pub fn targets(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.targets.iter().map(String::as_str))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn targets(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remove_equal_drops_all_duplicates() {
        let mut store = DataStore::default();
        store.push(json!({"name": "Sara"}), targets(&["T"]));
        store.push(json!({"name": "Sara"}), targets(&["T"]));
        store.push(json!({"name": "Max"}), targets(&["T"]));

        assert_eq!(store.remove_equal(&json!({"name": "Sara"})), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove_equal(&json!({"name": "Nobody"})), 0);
    }

    #[test]
    fn all_for_target_filters_and_keeps_order() {
        let mut store = DataStore::default();
        store.push(json!(1), targets(&["A"]));
        store.push(json!(2), targets(&["B"]));
        store.push(json!(3), targets(&["A", "B"]));

        let a: Vec<_> = store.all_for_target("A").cloned().collect();
        assert_eq!(a, vec![json!(1), json!(3)]);
        assert_eq!(store.targets(), ["A", "B"].into_iter().collect());
    }
}
