//! Rendering utilities for review and audit output (Markdown summaries).

#![forbid(unsafe_code)]

mod markdown;
mod model;

pub use markdown::render_markdown;
pub use model::{
    RenderableCall, RenderableData, RenderableFault, RenderableResponseSet, RenderableResult,
};
