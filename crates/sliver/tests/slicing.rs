//! Forward and backward slices over evaluated programs.

use std::collections::HashSet;

use sliver::annotation::{self, Annotations};
use sliver::programs::{self, Expected};
use sliver::syntax::{Expr, Pattern, ProgramBuilder};
use sliver::{
    Address, Annotated, Direction, Error, EvalConfig, ExprId, NodeId, Num, Program, Session, Value,
};

/// `let x = 3 + 4 in x * 2`, keeping the interesting program points.
struct LetArithmetic {
    program: Program,
    root: ExprId,
    three: ExprId,
    four: ExprId,
    two: ExprId,
    bound: ExprId,
}

fn let_arithmetic() -> LetArithmetic {
    let mut b = ProgramBuilder::new();
    let three = b.num(3.0);
    let four = b.num(4.0);
    let bound = b.binary(three, "+", four);
    let x = b.var("x");
    let two = b.num(2.0);
    let body = b.binary(x, "*", two);
    let root = b.let_("x", bound, body);
    LetArithmetic {
        program: b.finish(),
        root,
        three,
        four,
        two,
        bound,
    }
}

fn node_at(session: &Session<'_>, expr: ExprId) -> NodeId {
    session
        .store()
        .lookup(&Address::eval(session.prelude(), expr))
        .unwrap_or_else(|| panic!("e{} was never evaluated in the prelude", expr.0))
}

/// Every node evaluated from `expr`, in any environment.
fn nodes_of(session: &Session<'_>, expr: ExprId) -> Vec<NodeId> {
    let store = session.store();
    store
        .ids()
        .filter(|node| store.address(*node).expr() == Some(expr))
        .collect()
}

/// Number and string literals of `program`.
fn literals(program: &Program) -> Vec<ExprId> {
    program
        .exprs()
        .filter(|(_, expr)| matches!(expr, Expr::Num(_) | Expr::Str(_)))
        .map(|(id, _)| id)
        .collect()
}

fn unavailable(session: &Session<'_>) -> HashSet<Annotated> {
    session.annotations().flagged().collect()
}

#[test]
fn forward_from_a_literal_reaches_everything_computed_from_it() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(p.root).unwrap();
    assert_eq!(session.value(result), Some(&Value::Num(Num::from(14.0))));

    session.slice_forward(&[Annotated::Expr(p.three)]).unwrap();

    let sum = node_at(&session, p.bound);
    assert!(!session.is_available(p.three));
    assert!(!session.is_available(node_at(&session, p.three)));
    assert!(!session.is_available(sum), "x = 7 used 3");
    assert!(!session.is_available(result), "14 used x");

    assert!(session.is_available(node_at(&session, p.four)));
    assert!(nodes_of(&session, p.two).into_iter().all(|node| session.is_available(node)));
    assert!(session.is_available(p.four));
}

#[test]
fn backward_from_the_result_needs_every_operand() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(p.root).unwrap();

    session.slice_backward(&[Annotated::Node(result)]).unwrap();

    for expr in [p.three, p.four, p.two, p.bound, p.root] {
        assert!(session.is_needed(expr), "e{} should be needed", expr.0);
    }
    assert!(session.is_needed(node_at(&session, p.three)));
    assert!(session.is_needed(node_at(&session, p.bound)));
    assert!(!session.is_available(result), "availability is meaningless in a backward pass");

    let store = session.store();
    let library: Vec<NodeId> = session
        .annotations()
        .flagged_nodes()
        .filter(|node| store.is_library(*node))
        .collect();
    assert!(library.is_empty(), "primitives {library:?} are not part of this computation");
}

#[test]
fn list_results_need_their_elements() {
    let example = programs::map().unwrap();
    let mut session = Session::new(&example.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(example.root).unwrap();

    session.slice_backward(&[Annotated::Node(result)]).unwrap();
    let elements = literals(&example.program);
    assert_eq!(elements.len(), 3);
    for element in &elements {
        assert!(session.is_needed(*element), "e{} built part of [1, 4, 9]", element.0);
    }

    session.reset(Direction::Forward);
    session.slice_forward(&[Annotated::Expr(elements[1])]).unwrap();
    assert!(!session.is_available(result), "4 comes from 2");
}

#[test]
fn every_needed_literal_is_one_the_result_depends_on() {
    for (name, build) in programs::ALL {
        let example = build().unwrap();
        if !matches!(example.expected, Expected::Value(_)) {
            continue;
        }
        let mut session = Session::new(&example.program, EvalConfig::default()).unwrap();
        let result = session.evaluate(example.root).unwrap();
        session.slice_backward(&[Annotated::Node(result)]).unwrap();
        let needed: Vec<(ExprId, bool)> = literals(&example.program)
            .into_iter()
            .map(|literal| (literal, session.is_needed(literal)))
            .collect();

        for (literal, is_needed) in needed {
            session.reset(Direction::Forward);
            session.slice_forward(&[Annotated::Expr(literal)]).unwrap();
            assert_eq!(
                !session.is_available(result),
                is_needed,
                "{name}: withholding e{} against needing it",
                literal.0
            );
        }
    }
}

#[test]
fn backward_skips_constructor_fields_that_were_never_used() {
    // let p = Pair(10, 3 + 4) in match p with Pair(a, b) -> b * 2
    let mut b = ProgramBuilder::new();
    let ten = b.num(10.0);
    let three = b.num(3.0);
    let four = b.num(4.0);
    let sum = b.binary(three, "+", four);
    let pair = b.pair(ten, sum);
    let p = b.var("p");
    let field = b.var("b");
    let two = b.num(2.0);
    let doubled = b.binary(field, "*", two);
    let fields = Pattern::constr("Pair", vec![Pattern::var("a"), Pattern::var("b")]);
    let matched = b.match_(p, vec![(fields, doubled)]).unwrap();
    let root = b.let_("p", pair, matched);
    let program = b.finish();

    let mut session = Session::new(&program, EvalConfig::default()).unwrap();
    let result = session.evaluate(root).unwrap();
    assert_eq!(session.value(result), Some(&Value::Num(Num::from(14.0))));

    session.slice_backward(&[Annotated::Node(result)]).unwrap();

    assert!(session.is_needed(node_at(&session, three)));
    assert!(session.is_needed(node_at(&session, sum)));
    assert!(!session.is_needed(ten));
    assert!(!session.is_needed(node_at(&session, ten)));
    assert!(!session.store().is_known(node_at(&session, ten)), "10 was never demanded");
}

#[test]
fn forward_from_an_input_reaches_its_consumers() {
    // x * 2 with x supplied from outside.
    let mut b = ProgramBuilder::new();
    let x = b.var("x");
    let two = b.num(2.0);
    let body = b.binary(x, "*", two);
    let program = b.finish();

    let mut session = Session::new(&program, EvalConfig::default()).unwrap();
    let input = session.input(Value::Num(Num::from(21.0))).unwrap();
    let env = session.bind(session.prelude(), "x", input).unwrap();
    let result = session.evaluate_in(env, body).unwrap();
    assert_eq!(session.value(result), Some(&Value::Num(Num::from(42.0))));

    session.slice_forward(&[Annotated::Node(input)]).unwrap();
    assert!(!session.is_available(result));
    assert!(session.is_available(two));

    session.slice_backward(&[Annotated::Node(result)]).unwrap();
    assert!(session.is_needed(input));
}

#[test]
fn slices_are_dual_on_a_single_dependency() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(p.root).unwrap();
    let four = node_at(&session, p.four);

    session.slice_forward(&[Annotated::Node(four)]).unwrap();
    let lost = !session.is_available(result);

    session.slice_backward(&[Annotated::Node(result)]).unwrap();
    assert_eq!(lost, session.is_needed(four));
    assert!(lost);
}

#[test]
fn more_unavailable_inputs_never_make_more_available() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    session.evaluate(p.root).unwrap();

    session.slice_forward(&[Annotated::Expr(p.two)]).unwrap();
    let small = unavailable(&session);

    session.reset(Direction::Forward);
    session
        .slice_forward(&[Annotated::Expr(p.two), Annotated::Expr(p.four)])
        .unwrap();
    let large = unavailable(&session);

    assert!(small.is_subset(&large));
    assert!(large.len() > small.len());
}

#[test]
fn forward_passes_accumulate_until_reset() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    session.evaluate(p.root).unwrap();

    session.slice_forward(&[Annotated::Expr(p.three)]).unwrap();
    session.slice_forward(&[Annotated::Expr(p.two)]).unwrap();
    assert!(!session.is_available(p.three));
    let two = nodes_of(&session, p.two);
    assert!(!two.is_empty());
    assert!(two.into_iter().all(|node| !session.is_available(node)));

    session.reset(Direction::Forward);
    assert!(session.annotations().is_empty());
}

#[test]
fn a_pass_in_the_wrong_direction_is_rejected() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(p.root).unwrap();

    let mut annotations = Annotations::new(Direction::Backward);
    let roots = [Annotated::Node(result)];
    let err = annotation::slice_forward(&mut annotations, session.store(), &roots).unwrap_err();
    assert!(matches!(err, Error::DirectionViolation { direction: Direction::Backward, .. }));
}

#[test]
fn restricting_drops_flags_outside_the_computation() {
    let p = let_arithmetic();
    let mut session = Session::new(&p.program, EvalConfig::default()).unwrap();
    let result = session.evaluate(p.root).unwrap();
    let sum = node_at(&session, p.bound);

    session.slice_forward(&[Annotated::Expr(p.three)]).unwrap();
    session.restrict_to(sum);

    assert!(!session.is_available(sum));
    assert!(!session.is_available(node_at(&session, p.three)));
    assert!(session.is_available(result), "14 is not part of computing 7");
}
