use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Opaque rule body for one target. Only the policy evaluator interprets `source`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetRule {
    pub source: String,
}

impl TargetRule {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// JSON Schema document describing a template's constraint parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ParameterSchema(JsonValue);

impl ParameterSchema {
    pub fn new(document: JsonValue) -> Self {
        Self(document)
    }

    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }
}

/// A reusable policy definition.
///
/// `name` identifies the template; `kind` is the constraint kind it produces and must be unique
/// across all registered templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    pub name: String,
    pub kind: String,

    /// Target name -> rule body.
    pub targets: BTreeMap<String, TargetRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ParameterSchema>,
}

impl Template {
    /// Template whose kind equals its name, the common case.
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            kind: name.clone(),
            name,
            targets: BTreeMap::new(),
            schema: None,
        }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_target<T: Into<String>>(mut self, target: T, rule: TargetRule) -> Self {
        self.targets.insert(target.into(), rule);
        self
    }

    pub fn with_schema(mut self, schema: ParameterSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn rule_for(&self, target: &str) -> Option<&TargetRule> {
        self.targets.get(target)
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults_kind_to_name() {
        let t = Template::new("Foo").with_target("TestTarget", TargetRule::new("deny"));
        assert_eq!(t.kind, "Foo");
        assert_eq!(t.rule_for("TestTarget").map(|r| r.source.as_str()), Some("deny"));
        assert!(t.rule_for("Other").is_none());
    }

    #[test]
    fn schema_serializes_transparently() {
        let t = Template::new("Foo")
            .with_kind("FooKind")
            .with_schema(ParameterSchema::new(json!({"type": "object"})));
        let v = serde_json::to_value(&t).expect("serialize template");
        assert_eq!(v["schema"], json!({"type": "object"}));
        assert_eq!(v["kind"], "FooKind");

        let back: Template = serde_json::from_value(v).expect("deserialize template");
        assert_eq!(back, t);
    }
}
