//! The thread-safe client facade.
//!
//! All three stores live in one immutable [`StoreState`] snapshot behind a single lock. Writers
//! run every capability check against a snapshot first, then take the write lock only to
//! re-check what depends on stored state and apply through `Arc::make_mut`. That copies the state
//! only while an evaluation still holds the previous snapshot. Readers clone the `Arc` and
//! evaluate without holding any lock, so a Review or Audit always sees exactly one generation.

use crate::error::ClientError;
use crate::schema::JsonSchemaValidator;
use crate::transaction::{Operation, Transaction};
use anyhow::Context as _;
use constraint_domain::{
    Capabilities, Change, Context, EffectiveConfig, Executor, PolicyEvaluator, ResponseSet,
    SchemaValidator, StoreState, TargetResolver, TemplateOutcome,
};
use constraint_settings::Overrides;
use constraint_types::{Constraint, Template};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// What a commit step produced: `None` asks for a fresh attempt.
type Attempt<T> = Result<Option<(T, Vec<Change>)>, ClientError>;

/// Builds a [`Client`] from capabilities and configuration.
pub struct ClientBuilder {
    caps: Capabilities,
    config: EffectiveConfig,
}

impl ClientBuilder {
    /// Uses [`JsonSchemaValidator`] for parameter schemas.
    pub fn new(resolver: Arc<dyn TargetResolver>, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        Self::from_capabilities(Capabilities::new(
            Arc::new(JsonSchemaValidator),
            resolver,
            evaluator,
        ))
    }

    pub fn from_capabilities(caps: Capabilities) -> Self {
        Self {
            caps,
            config: EffectiveConfig::default(),
        }
    }

    pub fn schema_validator(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.caps.schema = schema;
        self
    }

    pub fn config(mut self, config: EffectiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve configuration from TOML text (empty text means defaults).
    pub fn config_toml(self, text: &str, overrides: Overrides) -> anyhow::Result<Self> {
        let cfg = if text.trim().is_empty() {
            constraint_settings::ClientConfigV1::default()
        } else {
            constraint_settings::parse_config_toml(text).context("parse config")?
        };
        let resolved =
            constraint_settings::resolve_config(cfg, overrides).context("resolve config")?;
        Ok(self.config(resolved.effective))
    }

    pub fn config_file(self, path: &Path, overrides: Overrides) -> anyhow::Result<Self> {
        let cfg = constraint_settings::load_config_file(path)?;
        let resolved = constraint_settings::resolve_config(cfg, overrides)
            .with_context(|| format!("resolve config {}", path.display()))?;
        Ok(self.config(resolved.effective))
    }

    pub fn build(self) -> anyhow::Result<Client> {
        let exec = Executor::new(self.config.max_parallelism).context("build evaluation pool")?;
        debug!(
            profile = %self.config.profile,
            trace = self.config.trace,
            max_parallelism = ?self.config.max_parallelism,
            max_results = ?self.config.max_results,
            "constraint client ready"
        );
        Ok(Client {
            state: RwLock::new(Arc::new(StoreState::default())),
            caps: self.caps,
            config: self.config,
            exec,
        })
    }
}

/// Accumulates templates, constraints and reference data, and evaluates objects against them.
///
/// Every method takes `&self`; share the client across threads with an `Arc`.
pub struct Client {
    state: RwLock<Arc<StoreState>>,
    caps: Capabilities,
    config: EffectiveConfig,
    exec: Executor,
}

impl Client {
    pub fn builder(
        resolver: Arc<dyn TargetResolver>,
        evaluator: Arc<dyn PolicyEvaluator>,
    ) -> ClientBuilder {
        ClientBuilder::new(resolver, evaluator)
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    // ------------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------------

    /// Register a template, replacing any template of the same name (unless the client is
    /// configured to reject conflicting re-adds).
    pub fn add_template(
        &self,
        ctx: &Context,
        template: Template,
    ) -> (Option<TemplateOutcome>, Transaction) {
        let tx = Transaction::begin(Operation::AddTemplate);
        if let Err(err) = ctx
            .check()
            .map_err(ClientError::from)
            .and_then(|()| StoreState::check_template(&template, &self.caps).map_err(Into::into))
        {
            return self.reject(tx, &template.name, err);
        }

        let kind = template.kind.as_str();
        self.mutate(
            ctx,
            tx,
            &template.name,
            |snapshot| {
                snapshot
                    .check_stored_parameters(&template, &self.caps)
                    .map_err(ClientError::from)
            },
            |state, snapshot| {
                state.check_template_placement(&template, &self.config)?;
                if !state.same_kind_as(snapshot, kind) {
                    return Ok(None);
                }
                Ok(Some(Arc::make_mut(state).apply_template(template.clone())))
            },
        )
    }

    /// Remove a template and every constraint of its kind. Removing an absent template is a
    /// successful no-op.
    pub fn remove_template(&self, ctx: &Context, template: &Template) -> Transaction {
        let name = template.name.as_str();
        let tx = Transaction::begin(Operation::RemoveTemplate);
        let (_, tx) = self.mutate(
            ctx,
            tx,
            name,
            |_| Ok(()),
            |state, _| {
                if state.templates().get(name).is_none() {
                    return Ok(Some(((), Vec::new())));
                }
                Ok(Some(((), Arc::make_mut(state).remove_template(name))))
            },
        );
        tx
    }

    // ------------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------------

    pub fn add_constraint(&self, ctx: &Context, constraint: Constraint) -> Transaction {
        let subject = constraint.key().to_string();
        let tx = Transaction::begin(Operation::AddConstraint);
        let kind = constraint.kind.as_str();
        let (_, tx) = self.mutate(
            ctx,
            tx,
            &subject,
            |snapshot| {
                snapshot
                    .validate_constraint(&constraint, &self.caps)
                    .map_err(ClientError::from)
            },
            |state, snapshot| {
                let current = state.template_for(&constraint)?;
                if Some(current) != snapshot.templates().by_kind(kind) {
                    return Ok(None);
                }
                Ok(Some(((), Arc::make_mut(state).apply_constraint(constraint.clone()))))
            },
        );
        tx
    }

    pub fn remove_constraint(&self, ctx: &Context, constraint: &Constraint) -> Transaction {
        let key = constraint.key();
        let subject = key.to_string();
        let tx = Transaction::begin(Operation::RemoveConstraint);
        let (_, tx) = self.mutate(
            ctx,
            tx,
            &subject,
            |_| Ok(()),
            |state, _| {
                if state.constraints().get(&key.kind, &key.name).is_none() {
                    return Ok(Some(((), Vec::new())));
                }
                Ok(Some(((), Arc::make_mut(state).remove_constraint(&key))))
            },
        );
        tx
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    /// Store a reference object under every target that handles it. Duplicates are kept as
    /// independent entries.
    pub fn add_data(&self, ctx: &Context, object: JsonValue) -> Transaction {
        let tx = Transaction::begin(Operation::AddData);
        let targets = match ctx
            .check()
            .map_err(ClientError::from)
            .and_then(|()| StoreState::resolve_data(&object, &self.caps).map_err(Into::into))
        {
            Ok(targets) => targets,
            Err(err) => return self.reject::<()>(tx, "data", err).1,
        };

        let (_, tx) = self.mutate(
            ctx,
            tx,
            "data",
            |_| Ok(()),
            |state, _| {
                let changes = Arc::make_mut(state).apply_data(object.clone(), targets.clone());
                Ok(Some(((), changes)))
            },
        );
        tx
    }

    /// Remove every stored entry structurally equal to `object`.
    pub fn remove_data(&self, ctx: &Context, object: &JsonValue) -> Transaction {
        let tx = Transaction::begin(Operation::RemoveData);
        let (_, tx) = self.mutate(
            ctx,
            tx,
            "data",
            |_| Ok(()),
            |state, _| {
                if !state.data().iter().any(|e| e.object == *object) {
                    return Ok(Some(((), Vec::new())));
                }
                Ok(Some(((), Arc::make_mut(state).remove_data(object))))
            },
        );
        tx
    }

    /// Drop all templates, constraints and data in one step.
    pub fn reset(&self, ctx: &Context) -> Transaction {
        let tx = Transaction::begin(Operation::Reset);
        let (_, tx) = self.mutate(
            ctx,
            tx,
            "all",
            |_| Ok(()),
            |state, _| {
                if state.templates().is_empty()
                    && state.constraints().is_empty()
                    && state.data().is_empty()
                {
                    return Ok(Some(((), Vec::new())));
                }
                Ok(Some(((), Arc::make_mut(state).clear())))
            },
        );
        tx
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Evaluate one candidate object against every active constraint of its targets.
    ///
    /// On failure (resolution error, cancellation) the returned set is empty and the
    /// transaction carries the error. Evaluator faults do not fail the call; they are reported in
    /// the set's error slot next to the results of the other pairs.
    pub fn review(&self, ctx: &Context, object: &JsonValue) -> (ResponseSet, Transaction) {
        self.evaluate(ctx, Operation::Review, |state| {
            constraint_domain::review(state, &self.caps, &self.config, &self.exec, ctx, object)
        })
    }

    /// Review every stored reference object and union the results.
    pub fn audit(&self, ctx: &Context) -> (ResponseSet, Transaction) {
        self.evaluate(ctx, Operation::Audit, |state| {
            constraint_domain::audit(state, &self.caps, &self.config, &self.exec, ctx)
        })
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// The current snapshot. It never changes; later mutations produce new snapshots.
    pub fn snapshot(&self) -> Arc<StoreState> {
        let guard = self.state.read().unwrap_or_else(|poisoned| {
            warn!("state lock poisoned by a panicking thread; recovering");
            self.state.clear_poison();
            poisoned.into_inner()
        });
        Arc::clone(&*guard)
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation()
    }

    pub fn template(&self, name: &str) -> Option<Template> {
        self.snapshot().templates().get(name).cloned()
    }

    pub fn constraint(&self, kind: &str, name: &str) -> Option<Constraint> {
        self.snapshot().constraints().get(kind, name).cloned()
    }

    /// Active constraints whose template declares `target`, ordered by (kind, name).
    pub fn constraints_for_target(&self, target: &str) -> Vec<Constraint> {
        self.snapshot()
            .constraints_for_target(target)
            .into_iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Stored reference objects for `target`, in insertion order.
    pub fn data_for_target(&self, target: &str) -> Vec<JsonValue> {
        self.snapshot().all_for_target(target).cloned().collect()
    }

    // ------------------------------------------------------------------------

    /// The stored state only ever changes through infallible `apply_*` calls, so a writer that
    /// panicked cannot have left it half-edited.
    fn write_state(&self) -> RwLockWriteGuard<'_, Arc<StoreState>> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("state lock poisoned by a panicking thread; recovering");
            self.state.clear_poison();
            poisoned.into_inner()
        })
    }

    fn reject<T>(
        &self,
        tx: Transaction,
        subject: &str,
        err: ClientError,
    ) -> (Option<T>, Transaction) {
        let op = tx.op();
        let generation = self.generation();
        warn!(%op, subject, generation, code = err.code(), "rejected: {err}");
        (None, tx.fail(generation, err))
    }

    /// Run `check` against a snapshot without holding the lock, then `commit` under the write
    /// lock. `commit` returns `Ok(None)` when the state moved on in a way that invalidates the
    /// check; the whole attempt then starts over from a fresh snapshot.
    ///
    /// Capabilities are only ever called from `check`, never while the lock is held.
    fn mutate<T, C, F>(
        &self,
        ctx: &Context,
        tx: Transaction,
        subject: &str,
        mut check: C,
        mut commit: F,
    ) -> (Option<T>, Transaction)
    where
        C: FnMut(&StoreState) -> Result<(), ClientError>,
        F: FnMut(&mut Arc<StoreState>, &StoreState) -> Attempt<T>,
    {
        let op = tx.op();
        loop {
            if let Err(interrupt) = ctx.check() {
                return self.reject(tx, subject, interrupt.into());
            }
            let snapshot = self.snapshot();
            if let Err(err) = check(snapshot.as_ref()) {
                return self.reject(tx, subject, err);
            }

            let mut guard = self.write_state();
            // The caller may have given up while we waited for the lock.
            if let Err(interrupt) = ctx.check() {
                drop(guard);
                return self.reject(tx, subject, interrupt.into());
            }

            let outcome = commit(&mut *guard, snapshot.as_ref());
            let generation = guard.generation();
            drop(guard);

            match outcome {
                Ok(Some((value, changes))) => {
                    if changes.is_empty() {
                        debug!(%op, subject, generation, "no change");
                    } else {
                        info!(%op, subject, generation, changes = changes.len(), "committed");
                    }
                    return (Some(value), tx.commit(generation, changes));
                }
                Ok(None) => {
                    debug!(%op, subject, generation, "state changed during checks; retrying");
                }
                Err(err) => {
                    warn!(%op, subject, generation, code = err.code(), "rejected: {err}");
                    return (None, tx.fail(generation, err));
                }
            }
        }
    }

    fn evaluate<F>(&self, ctx: &Context, op: Operation, f: F) -> (ResponseSet, Transaction)
    where
        F: FnOnce(&StoreState) -> Result<ResponseSet, constraint_domain::EngineError>,
    {
        let tx = Transaction::begin(op);
        let state = self.snapshot();
        let generation = state.generation();

        match f(state.as_ref()) {
            Ok(set) => {
                let faults = set.error().map_or(0, |e| e.len());
                if faults > 0 {
                    warn!(%op, generation, faults, "evaluator faults recorded");
                }
                debug!(
                    %op,
                    generation,
                    targets = set.len(),
                    results = set.results().len(),
                    truncated = set.truncated_reason().is_some(),
                    "evaluation finished"
                );
                (set, tx.commit(generation, Vec::new()))
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!(%op, generation, code = err.code(), "evaluation failed: {err}");
                (ResponseSet::new(generation), tx.fail(generation, err))
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}
