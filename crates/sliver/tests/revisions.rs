//! Editing inputs across revisions.

use pretty_assertions::assert_eq;
use sliver::syntax::ProgramBuilder;
use sliver::{Error, EvalConfig, ExprId, NodeId, Num, Program, Session, Value, WorldId};

fn num(n: f64) -> Value {
    Value::Num(Num::from(n))
}

/// `x * 2 + 1`, with `x` an input.
fn doubled() -> (Program, ExprId, ExprId) {
    let mut b = ProgramBuilder::new();
    let x = b.var("x");
    let two = b.num(2.0);
    let product = b.binary(x, "*", two);
    let one = b.num(1.0);
    let root = b.binary(product, "+", one);
    (b.finish(), root, one)
}

fn setup(program: &Program, config: EvalConfig, x: f64) -> (Session<'_>, NodeId, sliver::EnvId) {
    let mut session = Session::new(program, config).unwrap();
    let input = session.input(num(x)).unwrap();
    let env = session.bind(session.prelude(), "x", input).unwrap();
    (session, input, env)
}

#[test]
fn editing_an_input_keeps_node_identities() {
    let (program, root, _) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 20.0);
    let first = session.evaluate_in(env, root).unwrap();
    assert_eq!(session.value(first), Some(&num(41.0)));
    let before = session.store().current_world();

    let after = session.new_revision();
    session.update_input(input, num(5.0)).unwrap();
    let second = session.evaluate_in(env, root).unwrap();

    assert_eq!(second, first);
    assert_eq!(session.value(second), Some(&num(11.0)));
    assert_eq!(session.store().value_at(first, before), Some(&num(41.0)));
    assert_eq!(session.store().versions(first), vec![before, after]);
}

#[test]
fn unchanged_nodes_are_shared_with_the_parent_revision() {
    let (program, root, one) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 20.0);
    session.evaluate_in(env, root).unwrap();

    session.new_revision();
    session.update_input(input, num(5.0)).unwrap();
    session.evaluate_in(env, root).unwrap();

    let store = session.store();
    let literal = store
        .lookup(&sliver::Address::eval(env, one))
        .expect("the literal 1 was evaluated");
    assert_eq!(store.versions(literal), vec![WorldId::ROOT]);
    assert_eq!(store.value(literal), Some(&num(1.0)));
}

#[test]
fn changing_an_input_within_a_revision_collides() {
    let (program, root, _) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 20.0);
    session.evaluate_in(env, root).unwrap();

    let err = session.update_input(input, num(5.0)).unwrap_err();
    assert!(matches!(err, Error::AddressCollision { .. }), "{err}");

    // Writing the same value again is harmless.
    session.update_input(input, num(20.0)).unwrap();
}

#[test]
fn rewriting_an_unchanged_input_still_pins_it_for_the_revision() {
    let (program, root, _) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 20.0);
    session.evaluate_in(env, root).unwrap();

    session.new_revision();
    session.update_input(input, num(20.0)).unwrap();
    let err = session.update_input(input, num(5.0)).unwrap_err();
    assert!(matches!(err, Error::AddressCollision { .. }), "{err}");

    let result = session.evaluate_in(env, root).unwrap();
    assert_eq!(session.value(result), Some(&num(41.0)));
    assert_eq!(session.store().versions(input), vec![WorldId::ROOT]);
}

#[test]
fn older_revisions_stay_readable() {
    let (program, root, _) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 1.0);
    let result = session.evaluate_in(env, root).unwrap();

    session.new_revision();
    session.update_input(input, num(2.0)).unwrap();
    session.evaluate_in(env, root).unwrap();
    assert_eq!(session.value(result), Some(&num(5.0)));

    let mut ancestry = session.store().worlds().ancestry(session.store().current_world());
    assert_eq!(ancestry.next(), Some(WorldId(1)));
    assert_eq!(ancestry.next(), Some(WorldId::ROOT));
    assert_eq!(session.store().value_at(result, WorldId::ROOT), Some(&num(3.0)));
}

#[test]
fn memoisation_does_not_change_identities() {
    let (program, root, _) = doubled();
    let memo_off = EvalConfig {
        memoize: false,
        ..EvalConfig::default()
    };

    let (mut with_memo, _, env_memo) = setup(&program, EvalConfig::default(), 3.0);
    let (mut without_memo, _, env_plain) = setup(&program, memo_off, 3.0);
    let a = with_memo.evaluate_in(env_memo, root).unwrap();
    let b = without_memo.evaluate_in(env_plain, root).unwrap();

    assert_eq!(a, b);
    assert_eq!(with_memo.store().address(a), without_memo.store().address(b));
    assert_eq!(with_memo.value(a), without_memo.value(b));
    assert_eq!(with_memo.store().len(), without_memo.store().len());
}

#[test]
fn slices_see_the_current_revision() {
    let (program, root, _) = doubled();
    let (mut session, input, env) = setup(&program, EvalConfig::default(), 1.0);
    let result = session.evaluate_in(env, root).unwrap();

    session.new_revision();
    session.update_input(input, num(2.0)).unwrap();
    session.evaluate_in(env, root).unwrap();

    session.slice_backward(&[sliver::Annotated::Node(result)]).unwrap();
    assert!(session.is_needed(input));
}
