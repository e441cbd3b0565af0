use crate::{RenderableCall, RenderableResponseSet};

pub fn render_markdown(set: &RenderableResponseSet) -> String {
    let mut out = String::new();

    let title = match set.call {
        RenderableCall::Review => "Review",
        RenderableCall::Audit => "Audit",
    };
    let status = if !set.faults.is_empty() {
        "ERROR"
    } else if set.results.is_empty() {
        "ALLOWED"
    } else {
        "DENIED"
    };
    out.push_str(&format!("# Constraint {title}\n\n"));
    out.push_str(&format!(
        "- Status: **{}**\n- Generation: {}\n- Results: {} (emitted) / {} (total)\n",
        status, set.data.generation, set.data.results_emitted, set.data.results_total
    ));
    if set.targets.is_empty() {
        out.push_str("- Targets: none (object not handled)\n\n");
    } else {
        out.push_str(&format!("- Targets: {}\n\n", set.targets.join(", ")));
    }

    if let Some(r) = &set.data.truncated_reason {
        out.push_str(&format!("> Note: {}\n\n", r));
    }

    if set.results.is_empty() {
        out.push_str("No violations.\n");
    } else {
        out.push_str("## Violations\n\n");
        for r in &set.results {
            out.push_str(&format!(
                "- [{}] `{}`: {}\n  - object: `{}`\n",
                r.target, r.constraint, r.message, r.object
            ));
        }
    }

    if !set.faults.is_empty() {
        out.push_str("\n## Evaluation errors\n\n");
        for f in &set.faults {
            out.push_str(&format!("- [{}] `{}`: {}\n", f.target, f.constraint, f.message));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderableData, RenderableFault, RenderableResult};

    fn data(emitted: u32, total: u32) -> RenderableData {
        RenderableData {
            generation: 3,
            results_emitted: emitted,
            results_total: total,
            truncated_reason: None,
        }
    }

    #[test]
    fn renders_unhandled_review() {
        let set = RenderableResponseSet {
            call: RenderableCall::Review,
            targets: Vec::new(),
            results: Vec::new(),
            faults: Vec::new(),
            data: data(0, 0),
        };
        let md = render_markdown(&set);
        assert!(md.starts_with("# Constraint Review"));
        assert!(md.contains("Status: **ALLOWED**"));
        assert!(md.contains("Targets: none (object not handled)"));
        assert!(md.contains("No violations."));
    }

    #[test]
    fn renders_audit_violations_with_truncation() {
        let mut d = data(1, 2);
        d.truncated_reason = Some("results truncated to max_results=1 (of 2)".to_string());
        let set = RenderableResponseSet {
            call: RenderableCall::Audit,
            targets: vec!["test.target".to_string()],
            results: vec![RenderableResult {
                target: "test.target".to_string(),
                constraint: "Foo/ph".to_string(),
                object: r#"{"name":"Sara"}"#.to_string(),
                message: "DENIED".to_string(),
            }],
            faults: Vec::new(),
            data: d,
        };

        let md = render_markdown(&set);
        assert!(md.contains("# Constraint Audit"));
        assert!(md.contains("Status: **DENIED**"));
        assert!(md.contains("Generation: 3"));
        assert!(md.contains("Results: 1 (emitted) / 2 (total)"));
        assert!(md.contains("> Note: results truncated"));
        assert!(md.contains("- [test.target] `Foo/ph`: DENIED"));
        assert!(md.contains(r#"`{"name":"Sara"}`"#));
    }

    #[test]
    fn faults_take_precedence_in_status() {
        let set = RenderableResponseSet {
            call: RenderableCall::Review,
            targets: vec!["test.target".to_string()],
            results: Vec::new(),
            faults: vec![RenderableFault {
                target: "test.target".to_string(),
                constraint: "Foo/ph".to_string(),
                message: "boom".to_string(),
            }],
            data: data(0, 0),
        };

        let md = render_markdown(&set);
        assert!(md.contains("Status: **ERROR**"));
        assert!(md.contains("## Evaluation errors"));
        assert!(md.contains("- [test.target] `Foo/ph`: boom"));
    }
}
