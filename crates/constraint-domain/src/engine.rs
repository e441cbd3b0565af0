use crate::capability::{Capabilities, EvaluationError, ResolveError};
use crate::context::{Context, Interrupt};
use crate::error::{EvaluationErrors, EvaluationFault};
use crate::policy::EffectiveConfig;
use crate::response::{ResponseSet, Trace, TraceEntry, TraceOutcome};
use crate::state::StoreState;
use constraint_types::{Constraint, PolicyResult, TargetRule, Violation};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Why a Review or Audit call produced no response set at all.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error("target resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

/// Runs evaluator calls, either on a dedicated pool or on the shared rayon pool.
#[derive(Debug)]
pub struct Executor {
    pool: Option<ThreadPool>,
}

impl Executor {
    pub fn new(max_parallelism: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let pool = match max_parallelism {
            Some(n) if n > 0 => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("constraint-eval-{i}"))
                    .build()?,
            ),
            _ => None,
        };
        Ok(Self { pool })
    }

    /// Map `f` over `items` in parallel. Output order matches input order.
    fn run<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        let work = || -> Vec<R> { items.par_iter().map(&f).collect() };
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }
}

/// One (constraint, object) pair under one target.
struct Task<'a> {
    target: &'a str,
    constraint: &'a Constraint,
    rule: &'a TargetRule,
    object: &'a JsonValue,
}

/// Evaluate one candidate object against every active constraint of every target it resolves to.
pub fn review(
    state: &StoreState,
    caps: &Capabilities,
    cfg: &EffectiveConfig,
    exec: &Executor,
    ctx: &Context,
    object: &JsonValue,
) -> Result<ResponseSet, EngineError> {
    ctx.check()?;
    let targets = caps.resolver.resolve_targets(object)?;

    let mut responses = ResponseSet::new(state.generation());
    let mut tasks = Vec::new();
    for target in &targets {
        responses.open_target(target);
        for (constraint, rule) in state.constraints_for_target(target) {
            if caps.resolver.matches(target, constraint, object) {
                tasks.push(Task {
                    target,
                    constraint,
                    rule,
                    object,
                });
            }
        }
    }

    finish(tasks, responses, caps, cfg, exec, ctx)
}

/// Review every stored object under every target it was stored for, and union the results.
pub fn audit(
    state: &StoreState,
    caps: &Capabilities,
    cfg: &EffectiveConfig,
    exec: &Executor,
    ctx: &Context,
) -> Result<ResponseSet, EngineError> {
    ctx.check()?;

    let mut responses = ResponseSet::new(state.generation());
    for target in caps.resolver.known_targets() {
        responses.open_target(&target);
    }

    let mut tasks = Vec::new();
    for target in state.data().targets() {
        responses.open_target(target);
        for (constraint, rule) in state.constraints_for_target(target) {
            for object in state.all_for_target(target) {
                if caps.resolver.matches(target, constraint, object) {
                    tasks.push(Task {
                        target,
                        constraint,
                        rule,
                        object,
                    });
                }
            }
        }
    }

    finish(tasks, responses, caps, cfg, exec, ctx)
}

fn finish(
    tasks: Vec<Task<'_>>,
    mut responses: ResponseSet,
    caps: &Capabilities,
    cfg: &EffectiveConfig,
    exec: &Executor,
    ctx: &Context,
) -> Result<ResponseSet, EngineError> {
    let outcomes: Vec<Option<Result<Vec<Violation>, EvaluationError>>> = exec.run(&tasks, |t| {
        if ctx.interrupt().is_some() {
            return None;
        }
        Some(
            caps.evaluator
                .evaluate(ctx, t.rule, &t.constraint.parameters, t.object),
        )
    });

    // Interrupts are sticky, so any skipped task is caught here and partial results are dropped.
    ctx.check()?;

    let mut trace = cfg.trace.then(Trace::default);
    let mut faults = Vec::new();
    for (task, outcome) in tasks.iter().zip(outcomes) {
        let outcome = outcome.ok_or(Interrupt::Canceled)?;
        let trace_outcome = match outcome {
            Ok(violations) => {
                let count = violations.len();
                let response = responses.open_target(task.target);
                response.results.extend(
                    violations
                        .into_iter()
                        .map(|v| PolicyResult::new(task.target, task.constraint, task.object, v)),
                );
                if count == 0 {
                    TraceOutcome::Allowed
                } else {
                    TraceOutcome::Denied { count }
                }
            }
            Err(source) => {
                let message = source.message.clone();
                faults.push(EvaluationFault {
                    target: task.target.to_string(),
                    constraint: task.constraint.key(),
                    object: task.object.clone(),
                    source,
                });
                TraceOutcome::Fault { message }
            }
        };
        if let Some(trace) = trace.as_mut() {
            trace.push(TraceEntry {
                target: task.target.to_string(),
                constraint: task.constraint.key(),
                object: task.object.clone(),
                outcome: trace_outcome,
            });
        }
    }

    if let Some(max) = cfg.max_results {
        let total = responses.truncate_results(max);
        if total > max {
            responses.set_truncated_reason(format!(
                "results truncated to max_results={max} (of {total})"
            ));
        }
    }
    if let Some(trace) = trace {
        responses.set_trace(trace);
    }
    responses.set_error(EvaluationErrors::new(faults));
    Ok(responses)
}
