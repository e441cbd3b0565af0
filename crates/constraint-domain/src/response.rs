//! Result and trace model returned by Review and Audit.

use crate::error::EvaluationErrors;
use constraint_types::{ConstraintKey, PolicyResult, ids};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Results produced under one target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetResponse {
    pub target: String,
    pub results: Vec<PolicyResult>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceOutcome {
    Allowed,
    Denied { count: usize },
    Fault { message: String },
}

impl TraceOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            TraceOutcome::Allowed => ids::OUTCOME_ALLOWED,
            TraceOutcome::Denied { .. } => ids::OUTCOME_DENIED,
            TraceOutcome::Fault { .. } => ids::OUTCOME_FAULT,
        }
    }
}

/// One evaluator invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEntry {
    pub target: String,
    pub constraint: ConstraintKey,
    pub object: JsonValue,
    pub outcome: TraceOutcome,
}

/// Every evaluation attempt of one call, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregated output of one Review or Audit call.
///
/// An empty set (no per-target response at all) is distinct from a set whose responses carry
/// zero results: the latter is a successful evaluation with no denials.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseSet {
    responses: BTreeMap<String, TargetResponse>,
    trace: Option<Trace>,
    error: Option<EvaluationErrors>,
    truncated_reason: Option<String>,
    truncated_from: Option<usize>,
    generation: u64,
}

impl ResponseSet {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Ensure a (possibly empty) response exists for `target`.
    pub fn open_target(&mut self, target: &str) -> &mut TargetResponse {
        self.responses
            .entry(target.to_string())
            .or_insert_with(|| TargetResponse {
                target: target.to_string(),
                results: Vec::new(),
            })
    }

    pub fn set_trace(&mut self, trace: Trace) {
        self.trace = Some(trace);
    }

    pub fn set_error(&mut self, error: EvaluationErrors) {
        self.error = (!error.is_empty()).then_some(error);
    }

    pub fn set_truncated_reason(&mut self, reason: String) {
        self.truncated_reason = Some(reason);
    }

    /// Keep at most `max` results across targets (in target order). Returns the count before
    /// truncation.
    pub fn truncate_results(&mut self, max: usize) -> usize {
        let total = self.responses.values().map(|r| r.results.len()).sum();
        if total > max {
            self.truncated_from = Some(total);
        }
        let mut budget = max;
        for r in self.responses.values_mut() {
            let keep = r.results.len().min(budget);
            r.results.truncate(keep);
            budget -= keep;
        }
        total
    }

    /// All results across targets, in target order.
    pub fn results(&self) -> Vec<&PolicyResult> {
        self.responses
            .values()
            .flat_map(|r| r.results.iter())
            .collect()
    }

    /// Result count before any `max_results` truncation.
    pub fn total_results(&self) -> usize {
        self.truncated_from
            .unwrap_or_else(|| self.responses.values().map(|r| r.results.len()).sum())
    }

    pub fn into_results(self) -> Vec<PolicyResult> {
        self.responses
            .into_values()
            .flat_map(|r| r.results)
            .collect()
    }

    pub fn by_target(&self, target: &str) -> Option<&TargetResponse> {
        self.responses.get(target)
    }

    pub fn responses(&self) -> impl Iterator<Item = &TargetResponse> {
        self.responses.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(String::as_str)
    }

    /// Number of per-target responses (not results).
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn error(&self) -> Option<&EvaluationErrors> {
        self.error.as_ref()
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn truncated_reason(&self) -> Option<&str> {
        self.truncated_reason.as_deref()
    }

    /// Store generation the call evaluated against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Human-readable dump of every evaluation attempt, results and errors.
    pub fn trace_dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "generation: {}", self.generation);

        if self.responses.is_empty() {
            out.push_str("responses: none\n");
        }
        for r in self.responses.values() {
            let _ = writeln!(out, "target {}: {} result(s)", r.target, r.results.len());
            for res in &r.results {
                let _ = writeln!(
                    out,
                    "  {}/{} {} => {}",
                    res.constraint.kind, res.constraint.name, res.object, res.msg
                );
            }
        }
        if let Some(reason) = &self.truncated_reason {
            let _ = writeln!(out, "note: {reason}");
        }

        match &self.trace {
            None => out.push_str("trace: disabled\n"),
            Some(trace) => {
                let _ = writeln!(out, "trace: {} evaluation(s)", trace.len());
                for e in trace.entries() {
                    let outcome = match &e.outcome {
                        TraceOutcome::Allowed => "allowed".to_string(),
                        TraceOutcome::Denied { count } => format!("denied ({count})"),
                        TraceOutcome::Fault { message } => format!("fault: {message}"),
                    };
                    let _ = writeln!(
                        out,
                        "  [{}] {} {} => {}",
                        e.target, e.constraint, e.object, outcome
                    );
                }
            }
        }

        if let Some(err) = &self.error {
            let _ = writeln!(out, "errors: {err}");
        }
        out
    }
}
