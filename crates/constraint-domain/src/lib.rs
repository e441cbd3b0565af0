//! Pure policy state and evaluation (no IO).
//!
//! Input: templates, constraints and data handed over by the client, plus the external
//! capabilities (schema validator, target resolver, policy evaluator).
//! Output: validated store transitions and response sets.

#![forbid(unsafe_code)]

pub mod capability;
pub mod context;
pub mod error;
pub mod policy;
pub mod response;
pub mod state;
pub mod store;

mod engine;

pub use capability::{
    Capabilities, EvaluationError, PolicyEvaluator, ResolveError, SchemaError, SchemaValidator,
    TargetResolver,
};
pub use context::{Context, Interrupt};
pub use engine::{EngineError, Executor, audit, review};
pub use error::{EvaluationErrors, EvaluationFault, ValidationError};
pub use policy::{EffectiveConfig, TemplateConflict};
pub use response::{ResponseSet, TargetResponse, Trace, TraceEntry, TraceOutcome};
pub use state::{Change, StoreState, TemplateOutcome};

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;
