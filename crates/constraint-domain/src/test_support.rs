use crate::capability::{
    Capabilities, EvaluationError, PolicyEvaluator, ResolveError, SchemaError, SchemaValidator,
    TargetResolver,
};
use crate::context::Context;
use constraint_types::{
    Constraint, ParameterSchema, Parameters, Template, TargetRule, Violation,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const TEST_TARGET: &str = "TestTarget";
pub const OTHER_TARGET: &str = "OtherTarget";

/// Objects with a `name` land in `TestTarget`; an explicit `target` field overrides that.
/// `for_constraint` restricts which constraint kind applies.
pub struct TestResolver;

impl TargetResolver for TestResolver {
    fn known_targets(&self) -> BTreeSet<String> {
        [TEST_TARGET, OTHER_TARGET]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn resolve_targets(&self, object: &JsonValue) -> Result<BTreeSet<String>, ResolveError> {
        if let Some(t) = object.get("target").and_then(JsonValue::as_str) {
            return Ok([t.to_string()].into_iter().collect());
        }
        if object.get("name").is_some() {
            return Ok([TEST_TARGET.to_string()].into_iter().collect());
        }
        if object.get("broken").is_some() {
            return Err(ResolveError::new("broken object"));
        }
        Ok(BTreeSet::new())
    }

    fn matches(&self, _target: &str, constraint: &Constraint, object: &JsonValue) -> bool {
        match object.get("for_constraint").and_then(JsonValue::as_str) {
            Some(kind) => kind == constraint.kind,
            None => true,
        }
    }
}

/// Rules: `allow`, `deny:<msg>`, `fault:<msg>`, `deny-name:<param>` (deny when the object's
/// name equals the parameter). `invalid` fails preparation.
pub struct ScriptedEvaluator;

impl PolicyEvaluator for ScriptedEvaluator {
    fn prepare(
        &self,
        _template: &Template,
        _target: &str,
        rule: &TargetRule,
    ) -> Result<(), EvaluationError> {
        if rule.source == "invalid" {
            return Err(EvaluationError::new("rule does not compile"));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        _ctx: &Context,
        rule: &TargetRule,
        parameters: &Parameters,
        object: &JsonValue,
    ) -> Result<Vec<Violation>, EvaluationError> {
        let src = rule.source.as_str();
        if src == "allow" {
            return Ok(Vec::new());
        }
        if let Some(msg) = src.strip_prefix("deny:") {
            return Ok(vec![Violation::new(msg)]);
        }
        if let Some(msg) = src.strip_prefix("fault:") {
            return Err(EvaluationError::new(msg));
        }
        if let Some(key) = src.strip_prefix("deny-name:") {
            if let Some(name) = object.get("name")
                && parameters.get(key) == Some(name)
            {
                return Ok(vec![Violation::new(format!("name {name} is forbidden"))]);
            }
            return Ok(Vec::new());
        }
        Err(EvaluationError::new(format!("unknown rule {src}")))
    }
}

/// Accepts object schemas; enforces a top-level `required` list on parameters.
pub struct RequiredKeysSchema;

impl SchemaValidator for RequiredKeysSchema {
    fn validate(&self, schema: &ParameterSchema) -> Result<(), SchemaError> {
        if schema.as_value().is_object() {
            Ok(())
        } else {
            Err(SchemaError::new("schema must be an object"))
        }
    }

    fn validate_parameters(
        &self,
        schema: &ParameterSchema,
        parameters: &Parameters,
    ) -> Result<(), SchemaError> {
        let required = schema
            .as_value()
            .get("required")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        for key in required.iter().filter_map(JsonValue::as_str) {
            if parameters.get(key).is_none() {
                return Err(SchemaError::new(format!("missing required parameter {key}")));
            }
        }
        Ok(())
    }
}

pub fn caps() -> Capabilities {
    Capabilities::new(
        Arc::new(RequiredKeysSchema),
        Arc::new(TestResolver),
        Arc::new(ScriptedEvaluator),
    )
}

pub fn rule_template(name: &str, rule: &str) -> Template {
    Template::new(name).with_target(TEST_TARGET, TargetRule::new(rule))
}

pub fn deny_template(name: &str) -> Template {
    rule_template(name, "deny:DENIED")
}

pub fn schema_template(name: &str, schema: ParameterSchema) -> Template {
    deny_template(name).with_schema(schema)
}
