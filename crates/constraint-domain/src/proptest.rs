//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - constraints never outliving their template
//! - Review being equivalent to an Audit over a single stored object
//! - one result per stored object under a deny-all constraint
//! - removal of absent entries leaving the state untouched

use crate::context::Context;
use crate::engine::{Executor, audit, review};
use crate::policy::EffectiveConfig;
use crate::state::StoreState;
use crate::test_support::{caps, rule_template};
use constraint_types::{Constraint, Parameters};
use proptest::prelude::*;
use serde_json::{Value, json};

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

fn arb_kind() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Alpha", "Beta", "Gamma"]).prop_map(String::from)
}

fn arb_constraint_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,4}").expect("valid regex")
}

fn arb_rule() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("allow".to_string()),
        Just("deny:DENIED".to_string()),
        Just("deny-name:expected".to_string()),
    ]
}

fn arb_person() -> impl Strategy<Value = Value> {
    prop::sample::select(vec!["Sara", "Max", "Ada", "Lin"]).prop_map(|n| json!({ "name": n }))
}

#[derive(Clone, Debug)]
enum Op {
    AddTemplate { kind: String, rule: String },
    RemoveTemplate { kind: String },
    AddConstraint { kind: String, name: String },
    RemoveConstraint { kind: String, name: String },
    AddData(Value),
    RemoveData(Value),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_kind(), arb_rule()).prop_map(|(kind, rule)| Op::AddTemplate { kind, rule }),
        arb_kind().prop_map(|kind| Op::RemoveTemplate { kind }),
        (arb_kind(), arb_constraint_name())
            .prop_map(|(kind, name)| Op::AddConstraint { kind, name }),
        (arb_kind(), arb_constraint_name())
            .prop_map(|(kind, name)| Op::RemoveConstraint { kind, name }),
        arb_person().prop_map(Op::AddData),
        arb_person().prop_map(Op::RemoveData),
    ]
}

fn constraint(kind: &str, name: &str) -> Constraint {
    Constraint::new(kind, name).with_parameters(Parameters::new().with("expected", json!("Sara")))
}

/// Apply an op the way the client does: validate first, mutate only on success.
fn apply(state: &mut StoreState, op: &Op) {
    let caps = caps();
    let cfg = EffectiveConfig::default();
    match op {
        Op::AddTemplate { kind, rule } => {
            let t = rule_template(kind, rule);
            if state.validate_template(&t, &caps, &cfg).is_ok() {
                state.apply_template(t);
            }
        }
        Op::RemoveTemplate { kind } => {
            state.remove_template(kind);
        }
        Op::AddConstraint { kind, name } => {
            let c = constraint(kind, name);
            if state.validate_constraint(&c, &caps).is_ok() {
                state.apply_constraint(c);
            }
        }
        Op::RemoveConstraint { kind, name } => {
            state.remove_constraint(&constraint(kind, name).key());
        }
        Op::AddData(obj) => {
            if let Ok(targets) = StoreState::resolve_data(obj, &caps) {
                state.apply_data(obj.clone(), targets);
            }
        }
        Op::RemoveData(obj) => {
            state.remove_data(obj);
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn constraints_never_outlive_their_template(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut state = StoreState::default();
        for op in &ops {
            apply(&mut state, op);
            for c in state.constraints().iter() {
                prop_assert!(
                    state.templates().by_kind(&c.kind).is_some(),
                    "orphan constraint {}/{} after {:?}", c.kind, c.name, op
                );
            }
        }
    }

    #[test]
    fn review_equals_single_object_audit(
        setup in prop::collection::vec(arb_op(), 0..30),
        object in arb_person(),
    ) {
        let mut state = StoreState::default();
        for op in setup.iter().filter(|op| !matches!(op, Op::AddData(_) | Op::RemoveData(_))) {
            apply(&mut state, op);
        }
        let mut audited = state.clone();
        apply(&mut audited, &Op::AddData(object.clone()));

        let cfg = EffectiveConfig::default();
        let exec = Executor::new(Some(2)).expect("pool");
        let ctx = Context::background();
        let reviewed = review(&state, &caps(), &cfg, &exec, &ctx, &object).expect("review");
        let swept = audit(&audited, &caps(), &cfg, &exec, &ctx).expect("audit");

        prop_assert_eq!(reviewed.into_results(), swept.into_results());
    }

    #[test]
    fn deny_all_yields_one_result_per_object(
        objects in prop::collection::vec(arb_person(), 0..12)
    ) {
        let mut state = StoreState::default();
        state.apply_template(rule_template("Alpha", "deny:DENIED"));
        state.apply_constraint(constraint("Alpha", "ph"));
        for obj in &objects {
            apply(&mut state, &Op::AddData(obj.clone()));
        }

        let exec = Executor::new(None).expect("pool");
        let rsps = audit(
            &state,
            &caps(),
            &EffectiveConfig::default(),
            &exec,
            &Context::background(),
        )
        .expect("audit");
        let results = rsps.results();
        prop_assert_eq!(results.len(), objects.len());
        for (r, obj) in results.iter().zip(&objects) {
            prop_assert_eq!(&r.object, obj);
            prop_assert_eq!(r.msg.as_str(), "DENIED");
        }
    }

    #[test]
    fn removing_absent_entries_is_a_noop(ops in prop::collection::vec(arb_op(), 0..20)) {
        let mut state = StoreState::default();
        for op in &ops {
            apply(&mut state, op);
        }
        let generation = state.generation();
        let templates = state.templates().len();
        let constraints = state.constraints().len();
        let data = state.data().len();

        prop_assert!(state.remove_template("Missing").is_empty());
        prop_assert!(state.remove_constraint(&constraint("Missing", "x").key()).is_empty());
        let nobody = json!({"name": "Nobody"});
        prop_assert!(state.remove_data(&nobody).is_empty());

        prop_assert_eq!(state.generation(), generation);
        prop_assert_eq!(state.templates().len(), templates);
        prop_assert_eq!(state.constraints().len(), constraints);
        prop_assert_eq!(state.data().len(), data);
    }
}
