use crate::capability::{EvaluationError, ResolveError, SchemaError};
use constraint_types::{ConstraintKey, ids};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

/// Rejected mutation. The stores are left unchanged whenever one of these is returned.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("{what} must not be empty")]
    EmptyName { what: &'static str },

    #[error("template {name} declares no targets")]
    NoTargets { name: String },

    #[error("template {name} declares unknown target {target}")]
    UnknownTarget { name: String, target: String },

    #[error("kind {kind} is already produced by template {existing}")]
    KindConflict { kind: String, existing: String },

    #[error("template {name} already exists")]
    TemplateExists { name: String },

    #[error("invalid parameter schema for template {name}: {source}")]
    InvalidSchema {
        name: String,
        #[source]
        source: SchemaError,
    },

    #[error("rule for target {target} of template {name} rejected: {source}")]
    RuleRejected {
        name: String,
        target: String,
        #[source]
        source: EvaluationError,
    },

    #[error("no template produces kind {kind} (constraint {name})")]
    MissingTemplate { kind: String, name: String },

    #[error("invalid parameters for constraint {kind}/{name}: {source}")]
    InvalidParameters {
        kind: String,
        name: String,
        #[source]
        source: SchemaError,
    },

    #[error("no target handles object {object}")]
    UnhandledObject { object: JsonValue },

    #[error("target resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyName { .. } => ids::CODE_EMPTY_NAME,
            ValidationError::NoTargets { .. } => ids::CODE_NO_TARGETS,
            ValidationError::UnknownTarget { .. } => ids::CODE_UNKNOWN_TARGET,
            ValidationError::KindConflict { .. } => ids::CODE_KIND_CONFLICT,
            ValidationError::TemplateExists { .. } => ids::CODE_TEMPLATE_EXISTS,
            ValidationError::InvalidSchema { .. } => ids::CODE_INVALID_SCHEMA,
            ValidationError::RuleRejected { .. } => ids::CODE_RULE_REJECTED,
            ValidationError::MissingTemplate { .. } => ids::CODE_MISSING_TEMPLATE,
            ValidationError::InvalidParameters { .. } => ids::CODE_INVALID_PARAMETERS,
            ValidationError::UnhandledObject { .. } => ids::CODE_UNHANDLED_OBJECT,
            ValidationError::Resolve(_) => ids::CODE_RESOLVE_FAILED,
        }
    }
}

/// Evaluator failure for one (constraint, object) pair, with enough context to diagnose it.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("target {target}: constraint {constraint}: object {object}: {source}")]
pub struct EvaluationFault {
    pub target: String,
    pub constraint: ConstraintKey,
    pub object: JsonValue,
    #[source]
    pub source: EvaluationError,
}

impl EvaluationFault {
    pub fn code(&self) -> &'static str {
        ids::CODE_EVALUATION_FAULT
    }
}

/// Every fault recorded during one Review or Audit call, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationErrors(Vec<EvaluationFault>);

impl EvaluationErrors {
    pub fn new(faults: Vec<EvaluationFault>) -> Self {
        Self(faults)
    }

    pub fn faults(&self) -> &[EvaluationFault] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EvaluationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} evaluation fault(s)", self.0.len())?;
        for fault in &self.0 {
            write!(f, "; {fault}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvaluationErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}
