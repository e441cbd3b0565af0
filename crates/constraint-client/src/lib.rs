//! Policy constraint client.
//!
//! This crate is the application layer: a thread-safe [`Client`] that owns the template,
//! constraint and data stores, validates mutations, and runs Review and Audit against one
//! consistent snapshot. The heavy lifting lives in `constraint-domain`; this crate adds locking,
//! cancellation, transactions, logging, configuration and rendering.

#![forbid(unsafe_code)]

mod client;
mod error;
mod render;
mod schema;
mod transaction;

pub use client::{Client, ClientBuilder};
pub use error::ClientError;
pub use constraint_render::RenderableCall;
pub use render::{render_markdown, to_renderable};
pub use schema::JsonSchemaValidator;
pub use transaction::{Operation, Transaction};

pub use constraint_domain::{
    Capabilities, Change, Context, EffectiveConfig, EvaluationError, EvaluationErrors,
    EvaluationFault, Interrupt, PolicyEvaluator, ResolveError, ResponseSet, SchemaError,
    SchemaValidator, TargetResolver, TargetResponse, TemplateConflict, TemplateOutcome, Trace,
    TraceEntry, TraceOutcome, ValidationError,
};
pub use constraint_settings::Overrides;
pub use constraint_types::{
    Constraint, ConstraintKey, ParameterSchema, Parameters, PolicyResult, Template, TargetRule,
    Violation,
};
