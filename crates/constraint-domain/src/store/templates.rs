use constraint_types::Template;
use std::collections::BTreeMap;

/// Templates keyed by name, with a kind -> name index.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    by_name: BTreeMap<String, Template>,
    kinds: BTreeMap<String, String>,
}

impl TemplateStore {
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.by_name.get(name)
    }

    pub fn by_kind(&self, kind: &str) -> Option<&Template> {
        self.kinds.get(kind).and_then(|name| self.by_name.get(name))
    }

    /// Insert or replace by name. Returns the previous template.
    ///
    /// Callers must have checked kind uniqueness; the index follows the new template's kind.
    pub fn insert(&mut self, template: Template) -> Option<Template> {
        let previous = self.by_name.remove(&template.name);
        if let Some(prev) = &previous {
            self.kinds.remove(&prev.kind);
        }
        self.kinds.insert(template.kind.clone(), template.name.clone());
        self.by_name.insert(template.name.clone(), template);
        previous
    }

    pub fn remove(&mut self, name: &str) -> Option<Template> {
        let removed = self.by_name.remove(name)?;
        self.kinds.remove(&removed.kind);
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
