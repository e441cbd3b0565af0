//! Render use case: Markdown summaries of in-memory response sets.

use constraint_domain::ResponseSet;
use constraint_render::{
    RenderableCall, RenderableData, RenderableFault, RenderableResponseSet, RenderableResult,
};

pub fn to_renderable(set: &ResponseSet, call: RenderableCall) -> RenderableResponseSet {
    let results: Vec<RenderableResult> = set
        .results()
        .into_iter()
        .map(|r| RenderableResult {
            target: r.target.clone(),
            constraint: format!("{}/{}", r.constraint.kind, r.constraint.name),
            object: r.object.to_string(),
            message: r.msg.clone(),
        })
        .collect();

    let faults = set
        .error()
        .map(|errs| {
            errs.faults()
                .iter()
                .map(|f| RenderableFault {
                    target: f.target.clone(),
                    constraint: f.constraint.to_string(),
                    message: f.source.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    RenderableResponseSet {
        call,
        targets: set.targets().map(str::to_string).collect(),
        data: RenderableData {
            generation: set.generation(),
            results_emitted: count(results.len()),
            results_total: count(set.total_results()),
            truncated_reason: set.truncated_reason().map(str::to_string),
        },
        results,
        faults,
    }
}

/// Counts saturate rather than wrap in the render model.
fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

pub fn render_markdown(set: &ResponseSet, call: RenderableCall) -> String {
    constraint_render::render_markdown(&to_renderable(set, call))
}
