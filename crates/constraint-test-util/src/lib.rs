//! Shared test utilities for the constraint client workspace.
//!
//! Integration tests in several crates need the same target handler and evaluator doubles, so
//! they live here rather than behind `#[cfg(test)]`.

use constraint_domain::{
    Capabilities, Context, EvaluationError, PolicyEvaluator, ResolveError, SchemaError,
    SchemaValidator, TargetResolver,
};
use constraint_types::{
    Constraint, ParameterSchema, Parameters, Template, TargetRule, Violation,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// The only target the fake handler knows about.
pub const TEST_TARGET: &str = "test.target";

/// Reference/review object understood by [`TestTargetResolver`].
///
/// `for_constraint` (optional) limits the object to constraints of that kind.
pub fn target_data(name: &str) -> Value {
    json!({ "name": name })
}

pub fn target_data_for(name: &str, for_constraint: &str) -> Value {
    json!({ "name": name, "for_constraint": for_constraint })
}

/// Handles objects carrying a string `name`; everything else is unhandled.
/// An object with `"poison": true` makes resolution fail.
#[derive(Debug, Default)]
pub struct TestTargetResolver;

impl TargetResolver for TestTargetResolver {
    fn known_targets(&self) -> BTreeSet<String> {
        BTreeSet::from([TEST_TARGET.to_string()])
    }

    fn resolve_targets(&self, object: &Value) -> Result<BTreeSet<String>, ResolveError> {
        if object.get("poison").and_then(Value::as_bool) == Some(true) {
            return Err(ResolveError::new("object cannot be inspected"));
        }
        match object.get("name") {
            Some(Value::String(_)) => Ok(BTreeSet::from([TEST_TARGET.to_string()])),
            _ => Ok(BTreeSet::new()),
        }
    }

    fn matches(&self, _target: &str, constraint: &Constraint, object: &Value) -> bool {
        object
            .get("for_constraint")
            .and_then(Value::as_str)
            .is_none_or(|kind| kind == constraint.kind)
    }
}

/// Interprets rule sources as tiny scripts.
///
/// - `allow`
/// - `deny:<msg>`: one violation with `msg`
/// - `deny-if-name:<param>`: deny when the object's name equals parameter `<param>`
/// - `fault:<msg>`: evaluation error
/// - `sleep:<ms>`: honours cancellation while sleeping, then allows
/// - `slow-prepare:<ms>`: sleeps during preparation, then allows
///
/// A rule source of `invalid` fails preparation. Every evaluation is counted.
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PolicyEvaluator for ScriptedEvaluator {
    fn prepare(
        &self,
        _template: &Template,
        _target: &str,
        rule: &TargetRule,
    ) -> Result<(), EvaluationError> {
        if rule.source == "invalid" {
            return Err(EvaluationError::new("rule failed to compile"));
        }
        if let Some(ms) = rule.source.strip_prefix("slow-prepare:") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| EvaluationError::new(format!("bad prepare duration {ms}")))?;
            std::thread::sleep(Duration::from_millis(ms));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        ctx: &Context,
        rule: &TargetRule,
        parameters: &Parameters,
        object: &Value,
    ) -> Result<Vec<Violation>, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let src = rule.source.as_str();

        if src == "allow" || src.starts_with("slow-prepare:") {
            return Ok(Vec::new());
        }
        if let Some(msg) = src.strip_prefix("deny:") {
            return Ok(vec![Violation::new(msg).with_details(json!({}))]);
        }
        if let Some(msg) = src.strip_prefix("fault:") {
            return Err(EvaluationError::new(msg));
        }
        if let Some(key) = src.strip_prefix("deny-if-name:") {
            return Ok(match (object.get("name"), parameters.get(key)) {
                (Some(name), Some(expected)) if name == expected => vec![
                    Violation::new(format!("name {name} is not allowed"))
                        .with_details(json!({ "parameter": key })),
                ],
                _ => Vec::new(),
            });
        }
        if let Some(ms) = src.strip_prefix("sleep:") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| EvaluationError::new(format!("bad sleep duration {ms}")))?;
            for _ in 0..ms {
                if ctx.interrupt().is_some() {
                    return Err(EvaluationError::new("interrupted"));
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            return Ok(Vec::new());
        }
        Err(EvaluationError::new(format!("unknown rule {src}")))
    }
}

/// Accepts any object schema; enforces the top-level `required` list on parameters.
#[derive(Debug, Default)]
pub struct RequiredKeysSchema;

impl SchemaValidator for RequiredKeysSchema {
    fn validate(&self, schema: &ParameterSchema) -> Result<(), SchemaError> {
        if schema.as_value().is_object() {
            Ok(())
        } else {
            Err(SchemaError::new("schema must be a JSON object"))
        }
    }

    fn validate_parameters(
        &self,
        schema: &ParameterSchema,
        parameters: &Parameters,
    ) -> Result<(), SchemaError> {
        let Some(required) = schema.as_value().get("required").and_then(Value::as_array) else {
            return Ok(());
        };
        match required
            .iter()
            .filter_map(Value::as_str)
            .find(|key| parameters.get(key).is_none())
        {
            Some(key) => Err(SchemaError::new(format!("missing required parameter {key}"))),
            None => Ok(()),
        }
    }
}

/// Capabilities wired to the doubles above. The evaluator is returned too so tests can count
/// calls.
pub fn test_capabilities() -> (Capabilities, Arc<ScriptedEvaluator>) {
    let evaluator = Arc::new(ScriptedEvaluator::default());
    let caps = Capabilities::new(
        Arc::new(RequiredKeysSchema),
        Arc::new(TestTargetResolver),
        evaluator.clone(),
    );
    (caps, evaluator)
}

/// Template `kind` with a single rule for [`TEST_TARGET`].
pub fn rule_template(kind: &str, rule: &str) -> Template {
    Template::new(kind).with_target(TEST_TARGET, TargetRule::new(rule))
}

/// Template whose rule denies every object with `DENIED`.
pub fn deny_all_template(kind: &str) -> Template {
    rule_template(kind, "deny:DENIED")
}

pub fn constraint(kind: &str, name: &str) -> Constraint {
    Constraint::new(kind, name)
}

/// Replace the generation line of a trace dump so dumps from separate clients compare equal.
pub fn normalize_trace_dump(dump: &str) -> String {
    dump.lines()
        .map(|line| {
            if line.starts_with("generation: ") {
                "generation: __GENERATION__"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
