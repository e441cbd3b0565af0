//! The combined store state and its validated transitions.
//!
//! A `StoreState` value is one consistent snapshot of all three stores. Mutations are split in
//! two steps: `validate_*` (read-only, may fail) and `apply_*` (infallible). Callers that keep the
//! state behind copy-on-write can therefore reject a mutation without ever touching the stores.
//!
//! The `check_*` functions that take no `&self` call capabilities only and never read the stores.
//! A caller that serialises writers can run those outside its lock, and re-check the rest under
//! it.

use crate::capability::Capabilities;
use crate::error::ValidationError;
use crate::policy::{EffectiveConfig, TemplateConflict};
use crate::store::{ConstraintStore, DataStore, TemplateStore};
use constraint_types::{Constraint, ConstraintKey, Template, TargetRule};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

/// One committed change, reported back to the caller in its transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    TemplateAdded { name: String, kind: String },
    TemplateReplaced { name: String, kind: String },
    TemplateRemoved { name: String, kind: String },
    ConstraintAdded(ConstraintKey),
    ConstraintReplaced(ConstraintKey),
    ConstraintRemoved(ConstraintKey),
    DataAdded { targets: BTreeSet<String> },
    DataRemoved { count: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateOutcome {
    pub kind: String,
    pub targets: Vec<String>,
    /// A template with the same name and different content was already stored.
    pub replaced: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StoreState {
    templates: TemplateStore,
    constraints: ConstraintStore,
    data: DataStore,
    generation: u64,
}

impl StoreState {
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn constraints(&self) -> &ConstraintStore {
        &self.constraints
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Bumped once per mutation that changed anything.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Active constraints with a rule for `target`, in `(kind, name)` order.
    pub fn constraints_for_target(&self, target: &str) -> Vec<(&Constraint, &TargetRule)> {
        self.constraints
            .iter()
            .filter_map(|c| {
                let rule = self.templates.by_kind(&c.kind)?.rule_for(target)?;
                Some((c, rule))
            })
            .collect()
    }

    pub fn all_for_target<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = &'a JsonValue> + 'a {
        self.data.all_for_target(target)
    }

    // ------------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------------

    /// Run every template check in order: the stateless ones first, then the checks against
    /// this snapshot.
    pub fn validate_template(
        &self,
        template: &Template,
        caps: &Capabilities,
        cfg: &EffectiveConfig,
    ) -> Result<(), ValidationError> {
        Self::check_template(template, caps)?;
        self.check_template_placement(template, cfg)?;
        self.check_stored_parameters(template, caps)
    }

    /// Checks that depend on the template alone. They call into the resolver, the schema
    /// validator and the evaluator, so run them before taking any lock.
    pub fn check_template(template: &Template, caps: &Capabilities) -> Result<(), ValidationError> {
        if template.name.is_empty() {
            return Err(ValidationError::EmptyName {
                what: "template name",
            });
        }
        if template.kind.is_empty() {
            return Err(ValidationError::EmptyName {
                what: "template kind",
            });
        }
        if template.targets.is_empty() {
            return Err(ValidationError::NoTargets {
                name: template.name.clone(),
            });
        }

        let known = caps.resolver.known_targets();
        if let Some(target) = template.target_names().find(|t| !known.contains(*t)) {
            return Err(ValidationError::UnknownTarget {
                name: template.name.clone(),
                target: target.to_string(),
            });
        }

        if let Some(schema) = &template.schema {
            caps.schema
                .validate(schema)
                .map_err(|source| ValidationError::InvalidSchema {
                    name: template.name.clone(),
                    source,
                })?;
        }

        for (target, rule) in &template.targets {
            caps.evaluator
                .prepare(template, target, rule)
                .map_err(|source| ValidationError::RuleRejected {
                    name: template.name.clone(),
                    target: target.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Kind uniqueness and the conflict policy. Calls no capability.
    pub fn check_template_placement(
        &self,
        template: &Template,
        cfg: &EffectiveConfig,
    ) -> Result<(), ValidationError> {
        if let Some(existing) = self.templates.by_kind(&template.kind)
            && existing.name != template.name
        {
            return Err(ValidationError::KindConflict {
                kind: template.kind.clone(),
                existing: existing.name.clone(),
            });
        }

        if cfg.template_conflict == TemplateConflict::Reject
            && let Some(existing) = self.templates.get(&template.name)
            && existing != template
        {
            return Err(ValidationError::TemplateExists {
                name: template.name.clone(),
            });
        }
        Ok(())
    }

    /// A replacement that changes the schema must still accept every stored constraint of its
    /// kind.
    pub fn check_stored_parameters(
        &self,
        template: &Template,
        caps: &Capabilities,
    ) -> Result<(), ValidationError> {
        let Some(schema) = &template.schema else {
            return Ok(());
        };
        match self.templates.by_kind(&template.kind) {
            None => return Ok(()),
            Some(current) if current.schema.as_ref() == Some(schema) => return Ok(()),
            Some(_) => {}
        }
        for constraint in self.constraints.of_kind(&template.kind) {
            caps.schema
                .validate_parameters(schema, &constraint.parameters)
                .map_err(|source| ValidationError::InvalidParameters {
                    kind: constraint.kind.clone(),
                    name: constraint.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Whether `other` stores the same template and constraints for `kind`. A parameter check
    /// made against `other` still holds here when it does.
    pub fn same_kind_as(&self, other: &StoreState, kind: &str) -> bool {
        self.templates.by_kind(kind) == other.templates.by_kind(kind)
            && self.constraints.of_kind(kind).eq(other.constraints.of_kind(kind))
    }

    /// Store a validated template. Replacing a template under a new kind drops the old kind's
    /// constraints, exactly as removing it would.
    pub fn apply_template(&mut self, template: Template) -> (TemplateOutcome, Vec<Change>) {
        let outcome = |replaced| TemplateOutcome {
            kind: template.kind.clone(),
            targets: template.targets.keys().cloned().collect(),
            replaced,
        };

        if self.templates.get(&template.name) == Some(&template) {
            return (outcome(false), Vec::new());
        }
        let outcome = outcome(self.templates.get(&template.name).is_some());

        let name = template.name.clone();
        let kind = template.kind.clone();
        let mut changes = Vec::new();
        match self.templates.insert(template) {
            None => changes.push(Change::TemplateAdded { name, kind }),
            Some(prev) => {
                if prev.kind != kind {
                    changes.extend(
                        self.constraints
                            .remove_kind(&prev.kind)
                            .into_iter()
                            .map(Change::ConstraintRemoved),
                    );
                }
                changes.push(Change::TemplateReplaced { name, kind });
            }
        }
        (outcome, self.commit(changes))
    }

    /// Remove a template by name together with every constraint of its kind.
    pub fn remove_template(&mut self, name: &str) -> Vec<Change> {
        let Some(removed) = self.templates.remove(name) else {
            return Vec::new();
        };
        let mut changes: Vec<Change> = self
            .constraints
            .remove_kind(&removed.kind)
            .into_iter()
            .map(Change::ConstraintRemoved)
            .collect();
        changes.push(Change::TemplateRemoved {
            name: removed.name,
            kind: removed.kind,
        });
        self.commit(changes)
    }

    // ------------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------------

    pub fn validate_constraint(
        &self,
        constraint: &Constraint,
        caps: &Capabilities,
    ) -> Result<(), ValidationError> {
        let template = self.template_for(constraint)?;
        Self::check_parameters(template, constraint, caps)
    }

    /// The stored template a constraint instantiates.
    pub fn template_for(&self, constraint: &Constraint) -> Result<&Template, ValidationError> {
        if constraint.kind.is_empty() {
            return Err(ValidationError::EmptyName {
                what: "constraint kind",
            });
        }
        if constraint.name.is_empty() {
            return Err(ValidationError::EmptyName {
                what: "constraint name",
            });
        }
        self.templates
            .by_kind(&constraint.kind)
            .ok_or_else(|| ValidationError::MissingTemplate {
                kind: constraint.kind.clone(),
                name: constraint.name.clone(),
            })
    }

    /// Check constraint parameters against the template's schema, if it has one.
    pub fn check_parameters(
        template: &Template,
        constraint: &Constraint,
        caps: &Capabilities,
    ) -> Result<(), ValidationError> {
        let Some(schema) = &template.schema else {
            return Ok(());
        };
        caps.schema
            .validate_parameters(schema, &constraint.parameters)
            .map_err(|source| ValidationError::InvalidParameters {
                kind: constraint.kind.clone(),
                name: constraint.name.clone(),
                source,
            })
    }

    pub fn apply_constraint(&mut self, constraint: Constraint) -> Vec<Change> {
        let key = constraint.key();
        let change = match self.constraints.get(&key.kind, &key.name) {
            Some(existing) if existing == &constraint => return Vec::new(),
            Some(_) => Change::ConstraintReplaced(key),
            None => Change::ConstraintAdded(key),
        };
        self.constraints.insert(constraint);
        self.commit(vec![change])
    }

    pub fn remove_constraint(&mut self, key: &ConstraintKey) -> Vec<Change> {
        match self.constraints.remove(key) {
            Some(_) => self.commit(vec![Change::ConstraintRemoved(key.clone())]),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    /// Resolve the targets a data object will be stored under.
    pub fn resolve_data(
        object: &JsonValue,
        caps: &Capabilities,
    ) -> Result<BTreeSet<String>, ValidationError> {
        let targets = caps.resolver.resolve_targets(object)?;
        if targets.is_empty() {
            return Err(ValidationError::UnhandledObject {
                object: object.clone(),
            });
        }
        Ok(targets)
    }

    pub fn apply_data(&mut self, object: JsonValue, targets: BTreeSet<String>) -> Vec<Change> {
        self.data.push(object, targets.clone());
        self.commit(vec![Change::DataAdded { targets }])
    }

    pub fn remove_data(&mut self, object: &JsonValue) -> Vec<Change> {
        match self.data.remove_equal(object) {
            0 => Vec::new(),
            count => self.commit(vec![Change::DataRemoved { count }]),
        }
    }

    // ------------------------------------------------------------------------

    /// Drop everything, reporting removals in store order.
    pub fn clear(&mut self) -> Vec<Change> {
        let mut changes: Vec<Change> = self
            .constraints
            .iter()
            .map(|c| Change::ConstraintRemoved(c.key()))
            .collect();
        changes.extend(self.templates.iter().map(|t| Change::TemplateRemoved {
            name: t.name.clone(),
            kind: t.kind.clone(),
        }));
        if !self.data.is_empty() {
            changes.push(Change::DataRemoved {
                count: self.data.len(),
            });
        }
        self.templates = TemplateStore::default();
        self.constraints = ConstraintStore::default();
        self.data = DataStore::default();
        self.commit(changes)
    }

    fn commit(&mut self, changes: Vec<Change>) -> Vec<Change> {
        if !changes.is_empty() {
            self.generation += 1;
        }
        changes
    }
}
