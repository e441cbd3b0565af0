//! Stable identifiers for error conditions and trace outcomes.
//!
//! Codes are short snake_case discriminators. They are part of the public contract: callers
//! match on them instead of on rendered error messages.

// Codes: validation (mutations)
pub const CODE_MISSING_TEMPLATE: &str = "missing_template";
pub const CODE_KIND_CONFLICT: &str = "kind_conflict";
pub const CODE_TEMPLATE_EXISTS: &str = "template_exists";
pub const CODE_INVALID_SCHEMA: &str = "invalid_schema";
pub const CODE_INVALID_PARAMETERS: &str = "invalid_parameters";
pub const CODE_UNKNOWN_TARGET: &str = "unknown_target";
pub const CODE_NO_TARGETS: &str = "no_targets";
pub const CODE_EMPTY_NAME: &str = "empty_name";
pub const CODE_RULE_REJECTED: &str = "rule_rejected";
pub const CODE_UNHANDLED_OBJECT: &str = "unhandled_object";

// Codes: evaluation
pub const CODE_EVALUATION_FAULT: &str = "evaluation_fault";
pub const CODE_RESOLVE_FAILED: &str = "resolve_failed";

// Codes: call control
pub const CODE_CANCELED: &str = "canceled";
pub const CODE_DEADLINE_EXCEEDED: &str = "deadline_exceeded";

// Trace outcomes
pub const OUTCOME_ALLOWED: &str = "allowed";
pub const OUTCOME_DENIED: &str = "denied";
pub const OUTCOME_FAULT: &str = "fault";
