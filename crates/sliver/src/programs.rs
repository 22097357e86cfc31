//! Example programs, constructed with [`ProgramBuilder`] to avoid needing a parser.
//!
//! Each one carries the rendering of its expected result, which the CLI's
//! `test` command and the integration tests check.

use crate::error::Result;
use crate::syntax::{ExprId, Pattern, Program, ProgramBuilder};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Rendering of the fully evaluated result.
    Value(&'static str),
    /// Evaluation fails with an error whose message contains this text.
    Error(&'static str),
}

pub struct Example {
    pub name: &'static str,
    pub description: &'static str,
    pub program: Program,
    pub root: ExprId,
    pub expected: Expected,
}

pub type ExampleFn = fn() -> Result<Example>;

/// Every example, by name.
pub const ALL: &[(&str, ExampleFn)] = &[
    ("arithmetic", arithmetic),
    ("let_arithmetic", let_arithmetic),
    ("rounding", rounding),
    ("factorial", factorial),
    ("length", length),
    ("map", map),
    ("filter", filter),
    ("reverse", reverse),
    ("compose", compose),
    ("lexical_scoping", lexical_scoping),
    ("foldr_sum_squares", foldr_sum_squares),
    ("zip_with", zip_with),
    ("even_odd", even_odd),
    ("strings", strings),
    ("swap_pair", swap_pair),
    ("lazy_binding", lazy_binding),
    ("nil_against_cons", nil_against_cons),
];

pub fn by_name(name: &str) -> Option<Result<Example>> {
    ALL.iter()
        .find(|(example, _)| *example == name)
        .map(|(_, build)| build())
}

fn example(
    name: &'static str,
    description: &'static str,
    b: ProgramBuilder,
    root: ExprId,
    expected: Expected,
) -> Result<Example> {
    Ok(Example {
        name,
        description,
        program: b.finish(),
        root,
        expected,
    })
}

/// `(1 + 2) * (10 - 4) / 3 + 2 ** 3`
pub fn arithmetic() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let two = b.num(2.0);
    let sum = b.binary(one, "+", two);
    let ten = b.num(10.0);
    let four = b.num(4.0);
    let difference = b.binary(ten, "-", four);
    let product = b.binary(sum, "*", difference);
    let three = b.num(3.0);
    let quotient = b.binary(product, "/", three);
    let base = b.num(2.0);
    let exponent = b.num(3.0);
    let power = b.binary(base, "**", exponent);
    let root = b.binary(quotient, "+", power);
    example("arithmetic", "operator precedence spelled out", b, root, Expected::Value("14"))
}

/// `let x = 3 + 4 in x * 2`
pub fn let_arithmetic() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let three = b.num(3.0);
    let four = b.num(4.0);
    let bound = b.binary(three, "+", four);
    let x = b.var("x");
    let two = b.num(2.0);
    let body = b.binary(x, "*", two);
    let root = b.let_("x", bound, body);
    example("let_arithmetic", "a let-bound intermediate", b, root, Expected::Value("14"))
}

/// `ceiling (log 10) + floor 2.5`
pub fn rounding() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let ceiling = b.var("ceiling");
    let log = b.var("log");
    let ten = b.num(10.0);
    let ln = b.app(log, ten);
    let up = b.app(ceiling, ln);
    let floor = b.var("floor");
    let half = b.num(2.5);
    let down = b.app(floor, half);
    let root = b.binary(up, "+", down);
    example("rounding", "unary primitives", b, root, Expected::Value("5"))
}

/// `letrec fact = fun n -> if n == 0 then 1 else n * fact (n - 1) in fact 5`
pub fn factorial() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let n = b.var("n");
    let zero = b.num(0.0);
    let cond = b.binary(n, "==", zero);
    let one = b.num(1.0);
    let n = b.var("n");
    let fact = b.var("fact");
    let n_again = b.var("n");
    let one_again = b.num(1.0);
    let predecessor = b.binary(n_again, "-", one_again);
    let recurse = b.app(fact, predecessor);
    let product = b.binary(n, "*", recurse);
    let body = b.if_(cond, one, product);
    let func = b.lambda("n", body);
    let fact = b.var("fact");
    let five = b.num(5.0);
    let call = b.app(fact, five);
    let root = b.letrec(vec![("fact", func)], call);
    example("factorial", "recursion through a conditional", b, root, Expected::Value("120"))
}

/// `letrec length = fun { Nil -> 0 | Cons(x, xs) -> 1 + length xs } in length [5, 6, 7, 8]`
pub fn length() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let zero = b.num(0.0);
    let one = b.num(1.0);
    let length = b.var("length");
    let xs = b.var("xs");
    let rest = b.app(length, xs);
    let step = b.binary(one, "+", rest);
    let func = b.function(vec![
        (Pattern::nullary("Nil"), zero),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), step),
    ])?;
    let length = b.var("length");
    let list = b.numbers(&[5.0, 6.0, 7.0, 8.0]);
    let call = b.app(length, list);
    let root = b.letrec(vec![("length", func)], call);
    example("length", "elements are never demanded", b, root, Expected::Value("4"))
}

/// `letrec map = fun f -> fun { Nil -> Nil | Cons(x, xs) -> Cons(f x, map f xs) }
///  in map (fun x -> x * x) [1, 2, 3]`
pub fn map() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let nil = b.nil();
    let f = b.var("f");
    let x = b.var("x");
    let head = b.app(f, x);
    let map = b.var("map");
    let f = b.var("f");
    let xs = b.var("xs");
    let tail = b.apply(map, &[f, xs]);
    let cons = b.cons(head, tail);
    let cases = b.function(vec![
        (Pattern::nullary("Nil"), nil),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), cons),
    ])?;
    let func = b.lambda("f", cases);
    let y = b.var("y");
    let y_again = b.var("y");
    let square_body = b.binary(y, "*", y_again);
    let square = b.lambda("y", square_body);
    let map = b.var("map");
    let list = b.numbers(&[1.0, 2.0, 3.0]);
    let call = b.apply(map, &[square, list]);
    let root = b.letrec(vec![("map", func)], call);
    example("map", "a higher-order list function", b, root, Expected::Value("[1, 4, 9]"))
}

/// `letrec filter = fun p -> fun { Nil -> Nil
///   | Cons(x, xs) -> if p x then Cons(x, filter p xs) else filter p xs }
///  in filter (fun y -> y > 2) [1, 3, 2, 5]`
pub fn filter() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let nil = b.nil();
    let p = b.var("p");
    let x = b.var("x");
    let test = b.app(p, x);
    let x = b.var("x");
    let filter = b.var("filter");
    let p = b.var("p");
    let xs = b.var("xs");
    let kept_tail = b.apply(filter, &[p, xs]);
    let kept = b.cons(x, kept_tail);
    let filter = b.var("filter");
    let p = b.var("p");
    let xs = b.var("xs");
    let dropped = b.apply(filter, &[p, xs]);
    let step = b.if_(test, kept, dropped);
    let cases = b.function(vec![
        (Pattern::nullary("Nil"), nil),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), step),
    ])?;
    let func = b.lambda("p", cases);
    let y = b.var("y");
    let two = b.num(2.0);
    let above = b.binary(y, ">", two);
    let predicate = b.lambda("y", above);
    let filter = b.var("filter");
    let list = b.numbers(&[1.0, 3.0, 2.0, 5.0]);
    let call = b.apply(filter, &[predicate, list]);
    let root = b.letrec(vec![("filter", func)], call);
    example("filter", "conditionals inside recursion", b, root, Expected::Value("[3, 5]"))
}

/// `letrec rev = fun acc -> fun { Nil -> acc | Cons(x, xs) -> rev (Cons(x, acc)) xs }
///  in rev Nil [1, 2, 3]`
pub fn reverse() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let acc = b.var("acc");
    let rev = b.var("rev");
    let x = b.var("x");
    let acc_again = b.var("acc");
    let pushed = b.cons(x, acc_again);
    let xs = b.var("xs");
    let step = b.apply(rev, &[pushed, xs]);
    let cases = b.function(vec![
        (Pattern::nullary("Nil"), acc),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), step),
    ])?;
    let func = b.lambda("acc", cases);
    let rev = b.var("rev");
    let empty = b.nil();
    let list = b.numbers(&[1.0, 2.0, 3.0]);
    let call = b.apply(rev, &[empty, list]);
    let root = b.letrec(vec![("rev", func)], call);
    example("reverse", "an accumulating parameter", b, root, Expected::Value("[3, 2, 1]"))
}

/// `let compose = fun f -> fun g -> fun x -> f (g x) in
///  let inc = fun x -> x + 1 in let double = fun x -> x * 2 in compose inc double 5`
pub fn compose() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let f = b.var("f");
    let g = b.var("g");
    let x = b.var("x");
    let inner = b.app(g, x);
    let outer = b.app(f, inner);
    let over_x = b.lambda("x", outer);
    let over_g = b.lambda("g", over_x);
    let compose = b.lambda("f", over_g);

    let x = b.var("x");
    let one = b.num(1.0);
    let add = b.binary(x, "+", one);
    let inc = b.lambda("x", add);
    let x = b.var("x");
    let two = b.num(2.0);
    let mul = b.binary(x, "*", two);
    let double = b.lambda("x", mul);

    let compose_ref = b.var("compose");
    let inc_ref = b.var("inc");
    let double_ref = b.var("double");
    let five = b.num(5.0);
    let call = b.apply(compose_ref, &[inc_ref, double_ref, five]);
    let with_double = b.let_("double", double, call);
    let with_inc = b.let_("inc", inc, with_double);
    let root = b.let_("compose", compose, with_inc);
    example("compose", "closures returning closures", b, root, Expected::Value("11"))
}

/// `let x = 1 in let f = fun y -> x + y in let x = 100 in f 2`
pub fn lexical_scoping() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let one = b.num(1.0);
    let x = b.var("x");
    let y = b.var("y");
    let sum = b.binary(x, "+", y);
    let f = b.lambda("y", sum);
    let hundred = b.num(100.0);
    let f_ref = b.var("f");
    let two = b.num(2.0);
    let call = b.app(f_ref, two);
    let shadow = b.let_("x", hundred, call);
    let with_f = b.let_("f", f, shadow);
    let root = b.let_("x", one, with_f);
    example(
        "lexical_scoping",
        "closures capture their definition site",
        b,
        root,
        Expected::Value("3"),
    )
}

/// `letrec foldr = fun f -> fun z -> fun { Nil -> z | Cons(x, xs) -> f x (foldr f z xs) }
///  in foldr (fun x -> fun acc -> x * x + acc) 0 [1, 2, 3]`
pub fn foldr_sum_squares() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let z = b.var("z");
    let f = b.var("f");
    let x = b.var("x");
    let foldr = b.var("foldr");
    let f_again = b.var("f");
    let z_again = b.var("z");
    let xs = b.var("xs");
    let rest = b.apply(foldr, &[f_again, z_again, xs]);
    let step = b.apply(f, &[x, rest]);
    let cases = b.function(vec![
        (Pattern::nullary("Nil"), z),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), step),
    ])?;
    let over_z = b.lambda("z", cases);
    let func = b.lambda("f", over_z);

    let x = b.var("x");
    let x_again = b.var("x");
    let square = b.binary(x, "*", x_again);
    let acc = b.var("acc");
    let add = b.binary(square, "+", acc);
    let over_acc = b.lambda("acc", add);
    let combine = b.lambda("x", over_acc);

    let foldr = b.var("foldr");
    let zero = b.num(0.0);
    let list = b.numbers(&[1.0, 2.0, 3.0]);
    let call = b.apply(foldr, &[combine, zero, list]);
    let root = b.letrec(vec![("foldr", func)], call);
    example(
        "foldr_sum_squares",
        "a right fold with a curried combiner",
        b,
        root,
        Expected::Value("14"),
    )
}

/// `letrec zipWith = fun f -> fun
///   { Nil -> fun _ -> Nil
///   | Cons(x, xs) -> fun { Nil -> Nil | Cons(y, ys) -> Cons(f x y, zipWith f xs ys) } }
///  in zipWith (+) [1, 2, 3] [10, 20, 30]`
pub fn zip_with() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let nil = b.nil();
    let ignore = b.function(vec![(Pattern::Wild, nil)])?;

    let inner_nil = b.nil();
    let f = b.var("f");
    let x = b.var("x");
    let y = b.var("y");
    let head = b.apply(f, &[x, y]);
    let zip_with = b.var("zipWith");
    let f = b.var("f");
    let xs = b.var("xs");
    let ys = b.var("ys");
    let tail = b.apply(zip_with, &[f, xs, ys]);
    let both = b.cons(head, tail);
    let second = b.function(vec![
        (Pattern::nullary("Nil"), inner_nil),
        (Pattern::constr("Cons", vec![Pattern::var("y"), Pattern::var("ys")]), both),
    ])?;
    let first = b.function(vec![
        (Pattern::nullary("Nil"), ignore),
        (Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]), second),
    ])?;
    let func = b.lambda("f", first);

    let zip_with = b.var("zipWith");
    let plus = b.op("+");
    let left = b.numbers(&[1.0, 2.0, 3.0]);
    let right = b.numbers(&[10.0, 20.0, 30.0]);
    let call = b.apply(zip_with, &[plus, left, right]);
    let root = b.letrec(vec![("zipWith", func)], call);
    example(
        "zip_with",
        "an operator passed as a function",
        b,
        root,
        Expected::Value("[11, 22, 33]"),
    )
}

/// `letrec isEven = fun n -> if n == 0 then True else isOdd (n - 1)
///        isOdd = fun n -> if n == 0 then False else isEven (n - 1)
///  in isEven 6`
pub fn even_odd() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let is_even = parity(&mut b, true, "isOdd");
    let is_odd = parity(&mut b, false, "isEven");
    let is_even_ref = b.var("isEven");
    let six = b.num(6.0);
    let call = b.app(is_even_ref, six);
    let root = b.letrec(vec![("isEven", is_even), ("isOdd", is_odd)], call);
    example("even_odd", "mutual recursion in one group", b, root, Expected::Value("True"))
}

/// `fun n -> if n == 0 then base else other (n - 1)`
fn parity(b: &mut ProgramBuilder, base: bool, other: &str) -> ExprId {
    let n = b.var("n");
    let zero = b.num(0.0);
    let cond = b.binary(n, "==", zero);
    let answer = b.boolean(base);
    let other = b.var(other);
    let n = b.var("n");
    let one = b.num(1.0);
    let predecessor = b.binary(n, "-", one);
    let recurse = b.app(other, predecessor);
    let body = b.if_(cond, answer, recurse);
    b.lambda("n", body)
}

/// ```text
/// prim show = intToString
/// let greeting = "n=" ++ show (floor 7.6)
/// in if greeting === "n=7" then greeting ++ "!" else "no"
/// ```
pub fn strings() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let show_def = b.def_prim("show", "intToString");
    let prefix = b.string("n=");
    let show = b.var("show");
    let floor = b.var("floor");
    let seven = b.num(7.6);
    let floored = b.app(floor, seven);
    let shown = b.app(show, floored);
    let greeting = b.binary(prefix, "++", shown);
    let greeting_def = b.def_let("greeting", greeting);

    let greeting = b.var("greeting");
    let expected = b.string("n=7");
    let cond = b.binary(greeting, "===", expected);
    let greeting = b.var("greeting");
    let bang = b.string("!");
    let excited = b.binary(greeting, "++", bang);
    let no = b.string("no");
    let body = b.if_(cond, excited, no);
    let root = b.defs(vec![show_def, greeting_def], body);
    example(
        "strings",
        "string primitives and a primitive alias",
        b,
        root,
        Expected::Value("\"n=7!\""),
    )
}

/// `let swap = fun Pair(a, b) -> Pair(b, a) in swap (Pair(1, "one"))`
pub fn swap_pair() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let first = b.var("first");
    let second = b.var("second");
    let swapped = b.pair(second, first);
    let swap = b.function(vec![(
        Pattern::constr("Pair", vec![Pattern::var("first"), Pattern::var("second")]),
        swapped,
    )])?;
    let swap_ref = b.var("swap");
    let one = b.num(1.0);
    let name = b.string("one");
    let pair = b.pair(one, name);
    let call = b.app(swap_ref, pair);
    let root = b.let_("swap", swap, call);
    example("swap_pair", "destructuring a parameter", b, root, Expected::Value("Pair(\"one\", 1)"))
}

/// `let boom = error "never demanded" in 42`
pub fn lazy_binding() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let error = b.var("error");
    let message = b.string("never demanded");
    let boom = b.app(error, message);
    let answer = b.num(42.0);
    let root = b.let_("boom", boom, answer);
    example("lazy_binding", "unused bindings are never evaluated", b, root, Expected::Value("42"))
}

/// `match Nil with { Cons(h, t) -> h }`
pub fn nil_against_cons() -> Result<Example> {
    let mut b = ProgramBuilder::new();
    let nil = b.nil();
    let h = b.var("h");
    let root = b.match_(
        nil,
        vec![(Pattern::constr("Cons", vec![Pattern::var("h"), Pattern::var("t")]), h)],
    )?;
    example(
        "nil_against_cons",
        "a demand the value cannot satisfy",
        b,
        root,
        Expected::Error("demand mismatch"),
    )
}
