//! The three stores. Each is a plain container; cross-store rules live in [`crate::state`].

mod constraints;
mod data;
mod templates;

pub use constraints::ConstraintStore;
pub use data::{DataEntry, DataStore};
pub use templates::TemplateStore;
