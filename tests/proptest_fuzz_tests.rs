//! Property-based tests for the instrumentation pipeline
//!
//! Random assertion conditions over three `int` variables and a counting
//! function `tick(x) = x + 1` are instrumented and run, and checked against
//! a plain evaluation of the original condition:
//! 1. The instrumented assertion fails exactly when the original does
//! 2. Every call runs as often as in the original, never more
//! 3. Each variable is listed at most once
//! 4. Instrumentation is deterministic

use assert_introspect::ast::{
    ArithOp, AssertionSite, CType, CompareOp, Expression, OpaqueKind, SourceLocation,
};
use assert_introspect::compiler::{InstrumentOptions, InstrumentResult, Instrumenter, RuntimeRoutines};
use assert_introspect::runtime::{Environment, Evaluator, Outcome, Value};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

const NAMES: [&str; 3] = ["a", "b", "c"];

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (1u32..=3).prop_map(|decl| Expression::var(decl, NAMES[decl as usize - 1], CType::int())),
        (-3i64..=3).prop_map(Expression::int),
    ]
}

fn compare_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
        Just(CompareOp::Lt),
        Just(CompareOp::Le),
        Just(CompareOp::Gt),
        Just(CompareOp::Ge),
    ]
}

/// Arithmetic without division, so evaluation cannot fail
fn arith_op() -> impl Strategy<Value = ArithOp> {
    prop_oneof![Just(ArithOp::Add), Just(ArithOp::Sub), Just(ArithOp::Mul)]
}

fn condition() -> impl Strategy<Value = Expression> {
    leaf().prop_recursive(5, 40, 2, |inner| {
        prop_oneof![
            (compare_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expression::compare(op, l, r)),
            (arith_op(), inner.clone(), inner.clone())
                .prop_map(|(op, l, r)| Expression::arith(op, l, r)),
            (inner.clone(), inner.clone(), any::<bool>()).prop_map(|(l, r, short_circuit)| {
                Expression::LogicalAnd {
                    left: Box::new(l),
                    right: Box::new(r),
                    short_circuit,
                }
            }),
            (inner.clone(), inner.clone(), any::<bool>()).prop_map(|(l, r, short_circuit)| {
                Expression::LogicalOr {
                    left: Box::new(l),
                    right: Box::new(r),
                    short_circuit,
                }
            }),
            inner
                .clone()
                .prop_map(|arg| Expression::call("tick", vec![arg], CType::int())),
            inner.prop_map(|operand| {
                Expression::opaque(OpaqueKind::LogicalNot, vec![operand], CType::int())
            }),
        ]
    })
}

fn bindings() -> impl Strategy<Value = [i64; 3]> {
    [-3i64..=3, -3i64..=3, -3i64..=3]
}

// =============================================================================
// HELPERS
// =============================================================================

fn environment(values: [i64; 3]) -> (Environment, Rc<Cell<u32>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut env = Environment::new().with_function("tick", move |args| {
        counter.set(counter.get() + 1);
        Value::Int(args[0].as_int().unwrap_or(0).wrapping_add(1))
    });
    for (i, value) in values.iter().enumerate() {
        env = env.with_variable(i as u32 + 1, Value::Int(*value));
    }
    (env, calls)
}

fn instrument(condition: &Expression, options: InstrumentOptions) -> InstrumentResult {
    let site = AssertionSite::new(
        condition.clone(),
        condition.to_string(),
        SourceLocation::new("fuzz.c", 1, 1),
        "fuzz",
    );
    Instrumenter::new(options).instrument(&site, &RuntimeRoutines::libc())
}

fn plain_options() -> InstrumentOptions {
    InstrumentOptions {
        colors: false,
        show_ast: false,
        ..InstrumentOptions::default()
    }
}

/// Truth value and call count of the original condition
fn evaluate_plain(condition: &Expression, values: [i64; 3]) -> (bool, u32) {
    let (env, calls) = environment(values);
    let held = Evaluator::new(env)
        .eval(condition)
        .expect("plain evaluation")
        .is_truthy();
    (held, calls.get())
}

fn run_instrumented(result: &InstrumentResult, values: [i64; 3]) -> (Outcome, u32) {
    let (env, calls) = environment(values);
    let outcome = Evaluator::new(env).run(&result.tree).expect("instrumented run");
    (outcome, calls.get())
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fails_exactly_when_original_fails(cond in condition(), values in bindings()) {
        let (held, _) = evaluate_plain(&cond, values);
        let result = instrument(&cond, plain_options());
        prop_assert!(result.instrumented);

        let (outcome, _) = run_instrumented(&result, values);
        match outcome {
            Outcome::Passed => prop_assert!(held),
            Outcome::Aborted { output } => {
                prop_assert!(!held);
                prop_assert!(output.starts_with("fuzz.c:1: fuzz: assertion failed\n"), "{}", output);
            }
        }
    }

    #[test]
    fn calls_run_as_often_as_in_original(cond in condition(), values in bindings()) {
        let (_, expected) = evaluate_plain(&cond, values);
        let result = instrument(&cond, plain_options());
        let (_, calls) = run_instrumented(&result, values);
        prop_assert_eq!(calls, expected);
    }

    #[test]
    fn variables_listed_at_most_once(cond in condition(), values in bindings()) {
        let result = instrument(&cond, plain_options());
        let (outcome, _) = run_instrumented(&result, values);
        if let Outcome::Aborted { output } = outcome {
            prop_assert_eq!(output.lines().filter(|l| l.starts_with("  assert(")).count(), 1);
            for name in NAMES {
                let prefix = format!("  {} = ", name);
                let listed = output.lines().filter(|l| l.starts_with(&prefix)).count();
                prop_assert!(listed <= 1, "{} listed {} times:\n{}", name, listed, output);
            }
        }
    }

    #[test]
    fn depth_limit_keeps_semantics(
        cond in condition(),
        values in bindings(),
        max_depth in 1usize..4,
    ) {
        let (held, expected) = evaluate_plain(&cond, values);
        let options = InstrumentOptions { max_depth, ..plain_options() };
        let result = instrument(&cond, options);
        prop_assert!(result.instrumented);

        let (outcome, calls) = run_instrumented(&result, values);
        prop_assert_eq!(outcome == Outcome::Passed, held);
        prop_assert_eq!(calls, expected);
    }

    #[test]
    fn instrumentation_is_deterministic(cond in condition()) {
        let first = instrument(&cond, InstrumentOptions::default());
        let second = instrument(&cond, InstrumentOptions::default());
        prop_assert_eq!(first.tree, second.tree);
        prop_assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn tiny_buffers_never_break_the_handler(
        cond in condition(),
        values in bindings(),
        buffer_capacity in 2usize..16,
    ) {
        let (held, _) = evaluate_plain(&cond, values);
        let options = InstrumentOptions { buffer_capacity, ..plain_options() };
        let (outcome, _) = run_instrumented(&instrument(&cond, options), values);
        if let Outcome::Aborted { output } = outcome {
            prop_assert!(!held);
            let repr = output
                .lines()
                .find(|l| l.starts_with("  assert("))
                .unwrap_or_default();
            prop_assert!(repr.len() <= "  assert()".len() + buffer_capacity - 1);
        }
    }
}

// =============================================================================
// REGRESSION TESTS
// =============================================================================

#[test]
fn regression_constant_false_condition() {
    let result = instrument(&Expression::int(0), plain_options());
    let (outcome, _) = run_instrumented(&result, [0, 0, 0]);
    assert_eq!(
        outcome.output(),
        Some("fuzz.c:1: fuzz: assertion failed\n> assert(0)\n  assert(0)\n")
    );
}

#[test]
fn regression_call_nested_in_call() {
    // tick(tick(a)) == 0 with a = 1
    let a = Expression::var(1, "a", CType::int());
    let inner = Expression::call("tick", vec![a], CType::int());
    let outer = Expression::call("tick", vec![inner], CType::int());
    let cond = Expression::compare(CompareOp::Eq, outer, Expression::int(0));

    let result = instrument(&cond, plain_options());
    let (outcome, calls) = run_instrumented(&result, [1, 0, 0]);
    assert_eq!(calls, 2);
    let output = outcome.output().unwrap_or_default();
    assert!(output.contains("  assert(3 == 0)\n"), "{}", output);
    assert!(output.ends_with("  a = 1\n  tick(1) = 2\n  tick(2) = 3\n"), "{}", output);
}

#[test]
fn regression_strict_and_evaluates_both_sides() {
    // tick(a) & tick(b) in the non-short-circuit form, both sides false
    let cond = Expression::LogicalAnd {
        left: Box::new(Expression::call(
            "tick",
            vec![Expression::var(1, "a", CType::int())],
            CType::int(),
        )),
        right: Box::new(Expression::call(
            "tick",
            vec![Expression::var(2, "b", CType::int())],
            CType::int(),
        )),
        short_circuit: false,
    };
    let result = instrument(&cond, plain_options());
    let (outcome, calls) = run_instrumented(&result, [-1, -1, 0]);
    assert_eq!(calls, 2);
    let output = outcome.output().unwrap_or_default();
    assert!(output.contains("  b = -1\n"), "{}", output);
}
