use crate::Constraint;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

/// One denial reported by the policy evaluator for a (constraint, object) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    pub msg: String,

    /// Evaluator-specific structured payload (kept open-ended for forward compatibility).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: JsonValue,
}

impl Violation {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self {
            msg: msg.into(),
            details: JsonValue::Null,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }
}

/// One denial verdict as returned to callers.
///
/// `constraint` is the constraint exactly as it was added; `object` is the reviewed object (Review)
/// or the stored object (Audit).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyResult {
    pub target: String,
    pub constraint: Constraint,
    pub object: JsonValue,
    pub msg: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: JsonValue,

    /// Stable identifier intended for dedup and trending across audit runs.
    pub fingerprint: String,
}

impl PolicyResult {
    pub fn new(target: &str, constraint: &Constraint, object: &JsonValue, v: Violation) -> Self {
        let fingerprint = fingerprint_for_result(target, constraint, object, &v.msg);
        Self {
            target: target.to_string(),
            constraint: constraint.clone(),
            object: object.clone(),
            msg: v.msg,
            details: v.details,
            fingerprint,
        }
    }
}

/// Compute a stable SHA-256 fingerprint for a result.
///
/// Identity fields:
/// - target
/// - constraint kind and name
/// - message
/// - canonical JSON of the object
pub fn fingerprint_for_result(
    target: &str,
    constraint: &Constraint,
    object: &JsonValue,
    msg: &str,
) -> String {
    // serde_json maps are ordered, so this rendering is canonical.
    let object = object.to_string();
    let parts = [
        target,
        constraint.kind.as_str(),
        constraint.name.as_str(),
        msg,
        object.as_str(),
    ];
    let canonical = parts.join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_stable_and_sensitive_to_object() {
        let c = Constraint::new("Foo", "ph");
        let a = fingerprint_for_result("T", &c, &json!({"name": "Sara"}), "DENIED");
        let b = fingerprint_for_result("T", &c, &json!({"name": "Sara"}), "DENIED");
        let other = fingerprint_for_result("T", &c, &json!({"name": "Max"}), "DENIED");
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn result_copies_constraint_and_object() {
        let c = Constraint::new("Foo", "ph");
        let obj = json!({"name": "Sara"});
        let r = PolicyResult::new(
            "T",
            &c,
            &obj,
            Violation::new("DENIED").with_details(json!({"why": "always"})),
        );
        assert_eq!(r.constraint, c);
        assert_eq!(r.object, obj);
        assert_eq!(r.msg, "DENIED");
        assert_eq!(r.details["why"], "always");
    }
}
