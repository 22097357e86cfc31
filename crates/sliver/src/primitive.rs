//! The fixed primitive library.
//!
//! Binary primitives are curried: applying one to its first operand yields a
//! [`PrimValue::Partial`](crate::value::PrimValue::Partial), applying that to
//! the second operand computes the result.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::lattice::merge_by_equality;
use crate::syntax::{Program, TrieId};
use crate::value::Value;

/// The kind of value a primitive demands of its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Num,
    Str,
}

impl Operand {
    pub fn demand(self) -> TrieId {
        match self {
            Operand::Num => TrieId::NUM,
            Operand::Str => TrieId::STR,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Operand::Num => "a number",
            Operand::Str => "a string",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Ceiling,
    Floor,
    Log,
    IntToString,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    NumEq,
    NumLt,
    NumLe,
    NumGt,
    NumGe,
    StrEq,
    StrLt,
    StrLe,
    StrGt,
    StrGe,
    Concat,
}

merge_by_equality!(UnaryOp, BinaryOp);

impl UnaryOp {
    pub const ALL: [UnaryOp; 5] = [
        UnaryOp::Ceiling,
        UnaryOp::Floor,
        UnaryOp::Log,
        UnaryOp::IntToString,
        UnaryOp::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Ceiling => "ceiling",
            UnaryOp::Floor => "floor",
            UnaryOp::Log => "log",
            UnaryOp::IntToString => "intToString",
            UnaryOp::Error => "error",
        }
    }

    pub fn operand(self) -> Operand {
        match self {
            UnaryOp::Error => Operand::Str,
            _ => Operand::Num,
        }
    }

    pub fn apply(self, arg: &Value) -> Result<Value> {
        let name = self.name();
        Ok(match self {
            UnaryOp::Ceiling => Value::Num(OrderedFloat(expect_num(name, arg)?.ceil())),
            UnaryOp::Floor => Value::Num(OrderedFloat(expect_num(name, arg)?.floor())),
            UnaryOp::Log => Value::Num(OrderedFloat(expect_num(name, arg)?.ln())),
            UnaryOp::IntToString => Value::Str(expect_num(name, arg)?.to_string().into()),
            UnaryOp::Error => return Err(Error::UserError(expect_str(name, arg)?.to_string())),
        })
    }
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 16] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Pow,
        BinaryOp::NumEq,
        BinaryOp::NumLt,
        BinaryOp::NumLe,
        BinaryOp::NumGt,
        BinaryOp::NumGe,
        BinaryOp::StrEq,
        BinaryOp::StrLt,
        BinaryOp::StrLe,
        BinaryOp::StrGt,
        BinaryOp::StrGe,
        BinaryOp::Concat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
            BinaryOp::NumEq => "==",
            BinaryOp::NumLt => "<",
            BinaryOp::NumLe => "<=",
            BinaryOp::NumGt => ">",
            BinaryOp::NumGe => ">=",
            BinaryOp::StrEq => "===",
            BinaryOp::StrLt => "<<",
            BinaryOp::StrLe => "<==",
            BinaryOp::StrGt => ">>",
            BinaryOp::StrGe => ">==",
            BinaryOp::Concat => "++",
        }
    }

    pub fn operand(self) -> Operand {
        match self {
            BinaryOp::StrEq
            | BinaryOp::StrLt
            | BinaryOp::StrLe
            | BinaryOp::StrGt
            | BinaryOp::StrGe
            | BinaryOp::Concat => Operand::Str,
            _ => Operand::Num,
        }
    }

    /// Comparisons answer with the program's `True`/`False` constructors.
    pub fn apply(self, left: &Value, right: &Value, program: &Program) -> Result<Value> {
        let name = self.name();
        if self.operand() == Operand::Str {
            let (l, r) = (expect_str(name, left)?, expect_str(name, right)?);
            return Ok(match self {
                BinaryOp::Concat => Value::Str(format!("{l}{r}").into()),
                BinaryOp::StrEq => boolean(program, l == r),
                BinaryOp::StrLt => boolean(program, l < r),
                BinaryOp::StrLe => boolean(program, l <= r),
                BinaryOp::StrGt => boolean(program, l > r),
                _ => boolean(program, l >= r),
            });
        }
        let (l, r) = (expect_num(name, left)?, expect_num(name, right)?);
        Ok(match self {
            BinaryOp::Add => Value::Num(OrderedFloat(l + r)),
            BinaryOp::Sub => Value::Num(OrderedFloat(l - r)),
            BinaryOp::Mul => Value::Num(OrderedFloat(l * r)),
            BinaryOp::Div => Value::Num(OrderedFloat(l / r)),
            BinaryOp::Pow => Value::Num(OrderedFloat(l.powf(r))),
            BinaryOp::NumEq => boolean(program, l == r),
            BinaryOp::NumLt => boolean(program, l < r),
            BinaryOp::NumLe => boolean(program, l <= r),
            BinaryOp::NumGt => boolean(program, l > r),
            _ => boolean(program, l >= r),
        })
    }
}

/// Any library primitive, as bound in the prelude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl Primitive {
    pub fn all() -> impl Iterator<Item = Primitive> {
        UnaryOp::ALL
            .into_iter()
            .map(Primitive::Unary)
            .chain(BinaryOp::ALL.into_iter().map(Primitive::Binary))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|primitive| primitive.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Unary(op) => op.name(),
            Primitive::Binary(op) => op.name(),
        }
    }
}

fn boolean(program: &Program, value: bool) -> Value {
    let builtins = program.builtins();
    Value::Constr {
        tag: if value { builtins.true_tag } else { builtins.false_tag },
        args: Default::default(),
    }
}

fn expect_num(op: &'static str, value: &Value) -> Result<f64> {
    value.as_num().ok_or_else(|| Error::PrimitiveType {
        op,
        expected: Operand::Num.expected(),
        found: value.kind().to_string(),
    })
}

fn expect_str<'v>(op: &'static str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| Error::PrimitiveType {
        op,
        expected: Operand::Str.expected(),
        found: value.kind().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Num(OrderedFloat(n))
    }

    fn text(s: &str) -> Value {
        Value::Str(s.into())
    }

    #[test]
    fn arithmetic() {
        let program = Program::new();
        assert_eq!(BinaryOp::Add.apply(&num(3.0), &num(4.0), &program).unwrap(), num(7.0));
        assert_eq!(BinaryOp::Sub.apply(&num(3.0), &num(4.0), &program).unwrap(), num(-1.0));
        assert_eq!(BinaryOp::Div.apply(&num(7.0), &num(2.0), &program).unwrap(), num(3.5));
        assert_eq!(BinaryOp::Pow.apply(&num(2.0), &num(10.0), &program).unwrap(), num(1024.0));
    }

    #[test]
    fn comparisons_answer_with_booleans() {
        let program = Program::new();
        let truth = BinaryOp::NumLt.apply(&num(1.0), &num(2.0), &program).unwrap();
        assert!(matches!(truth, Value::Constr { tag, .. } if tag == program.builtins().true_tag));
        let falsity = BinaryOp::StrGt.apply(&text("apple"), &text("banana"), &program).unwrap();
        let false_tag = program.builtins().false_tag;
        assert!(matches!(falsity, Value::Constr { tag, .. } if tag == false_tag));
    }

    #[test]
    fn unary_library() {
        assert_eq!(UnaryOp::Ceiling.apply(&num(2.1)).unwrap(), num(3.0));
        assert_eq!(UnaryOp::Floor.apply(&num(2.9)).unwrap(), num(2.0));
        assert_eq!(UnaryOp::IntToString.apply(&num(42.0)).unwrap(), text("42"));
        assert_eq!(UnaryOp::Log.apply(&num(1.0)).unwrap(), num(0.0));
    }

    #[test]
    fn error_aborts_with_the_message() {
        let err = UnaryOp::Error.apply(&text("boom")).unwrap_err();
        assert!(matches!(err, Error::UserError(message) if message == "boom"));
    }

    #[test]
    fn operand_kinds_are_checked() {
        let program = Program::new();
        let err = BinaryOp::Concat.apply(&num(1.0), &text("x"), &program).unwrap_err();
        assert!(matches!(err, Error::PrimitiveType { op: "++", .. }));
        assert!(UnaryOp::Floor.apply(&text("x")).is_err());
    }

    #[test]
    fn names_resolve_back_to_primitives() {
        assert_eq!(Primitive::from_name("**"), Some(Primitive::Binary(BinaryOp::Pow)));
        assert_eq!(Primitive::from_name("floor"), Some(Primitive::Unary(UnaryOp::Floor)));
        assert_eq!(Primitive::from_name("sqrt"), None);
        assert_eq!(Primitive::all().count(), 21);
    }
}
