//! Keyword and primitive registries.
//!
//! Two immutable tables map names to [`BuiltinOp`] descriptors: the reserved
//! words that introduce special forms (`let`, `lambda`, `letrec`, `if`,
//! `begin`, `quote`, `void`, `exit`) and the primitive operators. The resolver
//! consults them whenever an identifier is not bound in the current
//! environment; a name found here only means something in call position.
//!
//! ## Primitives vs Special Forms
//!
//! - **Primitives**: fixed unary or binary operators whose operands are
//!   evaluated first and then type-checked (e.g., `+`, `car`, `eq?`)
//! - **Special Forms**: control how their arguments are resolved and evaluated
//!   (e.g., `if`, `letrec`, `quote`)
//!
//! ## Error Handling
//!
//! Every primitive is strict. An operand of the wrong type fails with
//! `Error::TypeError(<op>)`, displayed as `<op>: type error.`. There is no
//! coercion and no truthiness inside the primitives except for `not`, which
//! is true only for `#f`. Arithmetic wraps on overflow.
//!
//! ## Adding New Operations
//!
//! 1. Implement `fn(&Value) -> Result<Value, Error>` or
//!    `fn(&Value, &Value) -> Result<Value, Error>`
//! 2. Add a `BuiltinOp` entry to `PRIMITIVE_OPS`
//! 3. Add test cases to the table in this module and to the evaluator tests

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{NumberType, Value, ValueTag, cons};

/// Implementation of a one-operand primitive
pub type UnaryFn = fn(&Value) -> Result<Value, Error>;
/// Implementation of a two-operand primitive
pub type BinaryFn = fn(&Value, &Value) -> Result<Value, Error>;

/// Number of arguments a form accepts, not counting the head symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn validate(&self, arg_count: usize) -> Result<(), Error> {
        match *self {
            Arity::Exact(n) if arg_count != n => Err(Error::arity_error(n, arg_count)),
            Arity::AtLeast(n) if arg_count < n => Err(Error::arity_error(n, arg_count)),
            _ => Ok(()),
        }
    }
}

/// Special forms recognized by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Let,
    Lambda,
    Letrec,
    If,
    Begin,
    Quote,
    Void,
    Exit,
}

/// Represents the implementation of a keyword (primitive or special form)
#[derive(Clone, Copy)]
pub enum OpKind {
    Unary(UnaryFn),
    Binary(BinaryFn),
    SpecialForm(FormKind),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Unary(_) => write!(f, "Unary(<fn>)"),
            OpKind::Binary(_) => write!(f, "Binary(<fn>)"),
            OpKind::SpecialForm(form) => write!(f, "SpecialForm({form:?})"),
        }
    }
}

/// Definition of a keyword: reserved word or primitive operator
#[derive(Debug)]
pub struct BuiltinOp {
    pub scheme_id: &'static str,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.scheme_id == other.scheme_id
    }
}

impl BuiltinOp {
    pub fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    /// Check the argument count of a use of this keyword, naming it on failure
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count).map_err(|err| match err {
            Error::ArityError { expected, got, .. } => {
                Error::arity_error_with_expr(expected, got, self.scheme_id.to_owned())
            }
            other => other,
        })
    }
}

//
// Primitive implementations
//

fn expect_integers(op: &str, lhs: &Value, rhs: &Value) -> Result<(NumberType, NumberType), Error> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Ok((*a, *b)),
        _ => Err(Error::type_error(op)),
    }
}

macro_rules! arithmetic_op {
    ($name:ident, $method:ident, $op_str:expr) => {
        fn $name(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
            let (a, b) = expect_integers($op_str, lhs, rhs)?;
            Ok(Value::Integer(a.$method(b)))
        }
    };
}

arithmetic_op!(builtin_add, wrapping_add, "+");
arithmetic_op!(builtin_sub, wrapping_sub, "-");
arithmetic_op!(builtin_mul, wrapping_mul, "*");

macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
            let (a, b) = expect_integers($op_str, lhs, rhs)?;
            Ok(Value::Boolean(a $op b))
        }
    };
}

numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_le, <=, "<=");
numeric_comparison!(builtin_eq, ==, "=");
numeric_comparison!(builtin_ge, >=, ">=");
numeric_comparison!(builtin_gt, >, ">");

macro_rules! tag_predicate {
    ($name:ident, $tag:expr) => {
        fn $name(value: &Value) -> Result<Value, Error> {
            Ok(Value::Boolean(value.tag() == $tag))
        }
    };
}

tag_predicate!(builtin_is_boolean, ValueTag::Boolean);
tag_predicate!(builtin_is_fixnum, ValueTag::Integer);
tag_predicate!(builtin_is_symbol, ValueTag::Symbol);
tag_predicate!(builtin_is_null, ValueTag::EmptyList);
tag_predicate!(builtin_is_pair, ValueTag::Pair);
tag_predicate!(builtin_is_procedure, ValueTag::Closure);

fn builtin_cons(car: &Value, cdr: &Value) -> Result<Value, Error> {
    Ok(cons(car.clone(), cdr.clone()))
}

fn builtin_car(value: &Value) -> Result<Value, Error> {
    value
        .as_pair()
        .map(|pair| pair.car.clone())
        .ok_or_else(|| Error::type_error("car"))
}

fn builtin_cdr(value: &Value) -> Result<Value, Error> {
    value
        .as_pair()
        .map(|pair| pair.cdr.clone())
        .ok_or_else(|| Error::type_error("cdr"))
}

fn builtin_not(value: &Value) -> Result<Value, Error> {
    Ok(Value::Boolean(matches!(value, Value::Boolean(false))))
}

fn builtin_is_eq(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Boolean(lhs.is_same(rhs)))
}

const fn unary(scheme_id: &'static str, f: UnaryFn) -> BuiltinOp {
    BuiltinOp {
        scheme_id,
        op_kind: OpKind::Unary(f),
        arity: Arity::Exact(1),
    }
}

const fn binary(scheme_id: &'static str, f: BinaryFn) -> BuiltinOp {
    BuiltinOp {
        scheme_id,
        op_kind: OpKind::Binary(f),
        arity: Arity::Exact(2),
    }
}

const fn special_form(scheme_id: &'static str, form: FormKind, arity: Arity) -> BuiltinOp {
    BuiltinOp {
        scheme_id,
        op_kind: OpKind::SpecialForm(form),
        arity,
    }
}

static PRIMITIVE_OPS: [BuiltinOp; 19] = [
    // Arithmetic
    binary("+", builtin_add),
    binary("-", builtin_sub),
    binary("*", builtin_mul),
    // Comparison
    binary("<", builtin_lt),
    binary("<=", builtin_le),
    binary("=", builtin_eq),
    binary(">=", builtin_ge),
    binary(">", builtin_gt),
    // Pairs
    binary("cons", builtin_cons),
    unary("car", builtin_car),
    unary("cdr", builtin_cdr),
    // Logic and identity
    unary("not", builtin_not),
    binary("eq?", builtin_is_eq),
    // Type predicates
    unary("boolean?", builtin_is_boolean),
    unary("fixnum?", builtin_is_fixnum),
    unary("symbol?", builtin_is_symbol),
    unary("null?", builtin_is_null),
    unary("pair?", builtin_is_pair),
    unary("procedure?", builtin_is_procedure),
];

static RESERVED_WORD_OPS: [BuiltinOp; 8] = [
    special_form("let", FormKind::Let, Arity::Exact(2)),
    special_form("lambda", FormKind::Lambda, Arity::Exact(2)),
    special_form("letrec", FormKind::Letrec, Arity::Exact(2)),
    special_form("if", FormKind::If, Arity::Exact(3)),
    special_form("begin", FormKind::Begin, Arity::AtLeast(1)),
    special_form("quote", FormKind::Quote, Arity::Exact(1)),
    special_form("void", FormKind::Void, Arity::Exact(0)),
    special_form("exit", FormKind::Exit, Arity::Exact(0)),
];

static PRIMITIVES: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| PRIMITIVE_OPS.iter().map(|op| (op.scheme_id, op)).collect());

static RESERVED_WORDS: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| RESERVED_WORD_OPS.iter().map(|op| (op.scheme_id, op)).collect());

/// All primitive operators
pub fn primitive_ops() -> &'static [BuiltinOp] {
    &PRIMITIVE_OPS
}

/// All reserved words
pub fn reserved_word_ops() -> &'static [BuiltinOp] {
    &RESERVED_WORD_OPS
}

pub fn find_primitive(id: &str) -> Option<&'static BuiltinOp> {
    PRIMITIVES.get(id).copied()
}

pub fn find_reserved_word(id: &str) -> Option<&'static BuiltinOp> {
    RESERVED_WORDS.get(id).copied()
}

/// Find a keyword in either table; primitives take precedence
pub fn find_keyword(id: &str) -> Option<&'static BuiltinOp> {
    find_primitive(id).or_else(|| find_reserved_word(id))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};
    use maplit::hashset;
    use std::collections::HashSet;

    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_primitive(name).unwrap();
        match (&op.op_kind, args) {
            (OpKind::Unary(f), [a]) => f(a),
            (OpKind::Binary(f), [a, b]) => f(a, b),
            _ => panic!("bad test call to {name} with {} args", args.len()),
        }
    }

    #[test]
    fn test_registry_contents() {
        let primitive_names: HashSet<_> = primitive_ops().iter().map(|op| op.scheme_id).collect();
        assert_eq!(
            primitive_names,
            hashset! {
                "+", "-", "*", "<", "<=", "=", ">=", ">", "cons", "car", "cdr", "not", "eq?",
                "boolean?", "fixnum?", "symbol?", "null?", "pair?", "procedure?",
            }
        );

        let reserved_names: HashSet<_> =
            reserved_word_ops().iter().map(|op| op.scheme_id).collect();
        assert_eq!(
            reserved_names,
            hashset! { "let", "lambda", "letrec", "if", "begin", "quote", "void", "exit" }
        );

        assert!(primitive_names.is_disjoint(&reserved_names));
    }

    #[test]
    fn test_lookup() {
        let car = find_primitive("car").unwrap();
        assert_eq!(car.arity, Arity::Exact(1));
        assert!(!car.is_special_form());
        assert!(std::ptr::eq(car, find_keyword("car").unwrap()));

        let begin = find_reserved_word("begin").unwrap();
        assert!(begin.is_special_form());
        assert_eq!(begin.arity, Arity::AtLeast(1));
        assert!(find_primitive("begin").is_none());

        assert!(find_keyword("define").is_none());
        assert!(find_keyword("x").is_none());
    }

    #[test]
    fn test_arity_validation() {
        assert!(Arity::Exact(2).validate(2).is_ok());
        assert_eq!(Arity::Exact(2).validate(3), Err(Error::arity_error(2, 3)));
        assert!(Arity::AtLeast(1).validate(5).is_ok());
        assert_eq!(Arity::AtLeast(1).validate(0), Err(Error::arity_error(1, 0)));

        let err = find_reserved_word("if").unwrap().validate_arity(2).unwrap_err();
        assert_eq!(format!("{err}"), "ArityError: if: expected 3 arguments, got 2");
    }

    #[test]
    fn test_builtin_function_implementations() {
        let pair = cons(val(1), val(2));
        let test_cases: Vec<(&str, Vec<Value>, Result<Value, Error>)> = vec![
            // arithmetic
            ("+", vec![val(2), val(3)], Ok(val(5))),
            ("-", vec![val(2), val(3)], Ok(val(-1))),
            ("*", vec![val(-4), val(3)], Ok(val(-12))),
            ("+", vec![val(NumberType::MAX), val(1)], Ok(val(NumberType::MIN))),
            ("*", vec![val(NumberType::MIN), val(-1)], Ok(val(NumberType::MIN))),
            ("+", vec![val(1), val(true)], Err(Error::type_error("+"))),
            ("-", vec![sym("a"), val(1)], Err(Error::type_error("-"))),
            ("*", vec![nil(), nil()], Err(Error::type_error("*"))),
            // comparison
            ("<", vec![val(1), val(2)], Ok(val(true))),
            ("<", vec![val(2), val(2)], Ok(val(false))),
            ("<=", vec![val(2), val(2)], Ok(val(true))),
            ("=", vec![val(-7), val(-7)], Ok(val(true))),
            ("=", vec![val(-7), val(7)], Ok(val(false))),
            (">=", vec![val(1), val(2)], Ok(val(false))),
            (">", vec![val(3), val(2)], Ok(val(true))),
            ("=", vec![val(true), val(true)], Err(Error::type_error("="))),
            ("<", vec![val(1), sym("x")], Err(Error::type_error("<"))),
            // pairs
            ("cons", vec![val(1), nil()], Ok(val([1]))),
            ("cons", vec![sym("a"), val(true)], Ok(cons(sym("a"), val(true)))),
            ("car", vec![pair.clone()], Ok(val(1))),
            ("cdr", vec![pair.clone()], Ok(val(2))),
            ("car", vec![nil()], Err(Error::type_error("car"))),
            ("cdr", vec![val(3)], Err(Error::type_error("cdr"))),
            // not
            ("not", vec![val(false)], Ok(val(true))),
            ("not", vec![val(true)], Ok(val(false))),
            ("not", vec![val(0)], Ok(val(false))),
            ("not", vec![nil()], Ok(val(false))),
            // predicates
            ("boolean?", vec![val(false)], Ok(val(true))),
            ("boolean?", vec![val(0)], Ok(val(false))),
            ("fixnum?", vec![val(0)], Ok(val(true))),
            ("fixnum?", vec![sym("0")], Ok(val(false))),
            ("symbol?", vec![sym("a")], Ok(val(true))),
            ("symbol?", vec![nil()], Ok(val(false))),
            ("null?", vec![nil()], Ok(val(true))),
            ("null?", vec![pair.clone()], Ok(val(false))),
            ("pair?", vec![pair.clone()], Ok(val(true))),
            ("pair?", vec![nil()], Ok(val(false))),
            ("procedure?", vec![val(1)], Ok(val(false))),
            ("procedure?", vec![Value::Void], Ok(val(false))),
            // eq?
            ("eq?", vec![val(5), val(5)], Ok(val(true))),
            ("eq?", vec![sym("a"), sym("a")], Ok(val(true))),
            ("eq?", vec![val(false), val(false)], Ok(val(true))),
            ("eq?", vec![nil(), nil()], Ok(val(true))),
            ("eq?", vec![pair.clone(), pair.clone()], Ok(val(true))),
            ("eq?", vec![pair.clone(), cons(val(1), val(2))], Ok(val(false))),
            ("eq?", vec![val(1), val(true)], Ok(val(false))),
        ];

        for (i, (name, args, expected)) in test_cases.into_iter().enumerate() {
            let actual = call_builtin(name, &args);
            assert_eq!(actual, expected, "case #{} ({name})", i + 1);
        }
    }

    #[test]
    fn test_type_error_message() {
        let err = call_builtin("car", &[val(1)]).unwrap_err();
        assert_eq!(format!("{err}"), "car: type error.");
    }
}
