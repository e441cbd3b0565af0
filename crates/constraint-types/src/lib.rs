//! Stable DTOs and IDs used across the constraint client workspace.
//!
//! This crate is intentionally boring:
//! - templates, target rules and parameter schemas
//! - constraints and their parameter payloads
//! - evaluator violations and the results built from them
//! - stable string codes for errors and trace outcomes

#![forbid(unsafe_code)]

pub mod constraint;
pub mod ids;
pub mod result;
pub mod template;

pub use constraint::{Constraint, ConstraintKey, Parameters};
pub use result::{PolicyResult, Violation, fingerprint_for_result};
pub use template::{ParameterSchema, Template, TargetRule};
