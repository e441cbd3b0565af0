//! External capabilities consumed by the stores and the orchestrator.
//!
//! None of these are implemented here: the policy runtime, the schema language and the mapping
//! from objects to targets all live outside this crate.

use crate::context::Context;
use constraint_types::{Constraint, ParameterSchema, Parameters, Template, TargetRule, Violation};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SchemaError {
    pub message: String,
}

impl SchemaError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Runtime or compile fault raised by the policy evaluator. Distinct from a denial.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvaluationError {
    pub message: String,
}

impl EvaluationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait SchemaValidator: Send + Sync {
    /// Check a template's parameter schema.
    fn validate(&self, schema: &ParameterSchema) -> Result<(), SchemaError>;

    /// Check a constraint's parameters against its template's schema.
    fn validate_parameters(
        &self,
        _schema: &ParameterSchema,
        _parameters: &Parameters,
    ) -> Result<(), SchemaError> {
        Ok(())
    }
}

pub trait TargetResolver: Send + Sync {
    /// Targets templates may declare rules for.
    fn known_targets(&self) -> BTreeSet<String>;

    /// Targets an object is evaluated under. An empty set means no target handles it.
    fn resolve_targets(&self, object: &JsonValue) -> Result<BTreeSet<String>, ResolveError>;

    /// Whether `constraint` applies to `object` under `target`.
    fn matches(&self, _target: &str, _constraint: &Constraint, _object: &JsonValue) -> bool {
        true
    }
}

pub trait PolicyEvaluator: Send + Sync {
    /// Called once per declared target when a template is added; reject rules that cannot run.
    fn prepare(
        &self,
        _template: &Template,
        _target: &str,
        _rule: &TargetRule,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }

    /// Evaluate one rule against one object. Empty = allow, non-empty = deny.
    fn evaluate(
        &self,
        ctx: &Context,
        rule: &TargetRule,
        parameters: &Parameters,
        object: &JsonValue,
    ) -> Result<Vec<Violation>, EvaluationError>;
}

/// The capability set a client is built with.
#[derive(Clone)]
pub struct Capabilities {
    pub schema: Arc<dyn SchemaValidator>,
    pub resolver: Arc<dyn TargetResolver>,
    pub evaluator: Arc<dyn PolicyEvaluator>,
}

impl Capabilities {
    pub fn new(
        schema: Arc<dyn SchemaValidator>,
        resolver: Arc<dyn TargetResolver>,
        evaluator: Arc<dyn PolicyEvaluator>,
    ) -> Self {
        Self {
            schema,
            resolver,
            evaluator,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("known_targets", &self.resolver.known_targets())
            .finish_non_exhaustive()
    }
}
