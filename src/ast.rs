//! Runtime values.
//!
//! [`Value`] is a closed set of variants matched exhaustively everywhere it is
//! inspected: primitives type-check their operands by pattern matching, and the
//! type predicates compare [`ValueTag`]s. Compound values (pairs and closures)
//! are reference counted, so copying a `Value` never copies structure and `eq?`
//! can compare them by identity.
//!
//! Pairs are immutable and closures only capture already-built environments, so
//! the value graph has no cycles apart from the `letrec` case documented on
//! [`crate::environment::Environment`]. Adding a mutation primitive for pairs
//! would invalidate that assumption.
//!
//! Helper functions [`val`], [`sym`], [`cons`], [`list`] and [`nil`] build
//! values concisely in tests and embedding code.

use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::expr::Expr;

/// Type alias for fixnums in the interpreter
pub type NumberType = i64;

/// Discriminant of a [`Value`], used by the type predicates and by `eq?`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Integer,
    Boolean,
    Symbol,
    Pair,
    EmptyList,
    Void,
    Closure,
    Uninitialized,
    Termination,
}

#[derive(Debug)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

/// Unlinks the cdr spine iteratively; the derived drop would recurse once per element.
impl Drop for Pair {
    fn drop(&mut self) {
        let mut tail = std::mem::replace(&mut self.cdr, Value::EmptyList);
        while let Value::Pair(next) = tail {
            match Rc::try_unwrap(next) {
                Ok(mut pair) => tail = std::mem::replace(&mut pair.cdr, Value::EmptyList),
                // the rest of the chain is still referenced elsewhere
                Err(_) => break,
            }
        }
    }
}

/// A user procedure: parameters and body, plus the environment that was active
/// where its `lambda` was evaluated. The environment is shared, not copied.
pub struct Closure {
    pub params: Rc<[String]>,
    pub body: Rc<Expr>,
    pub env: Environment,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(NumberType),
    Boolean(bool),
    /// Only produced by quoting an identifier
    Symbol(String),
    Pair(Rc<Pair>),
    EmptyList,
    /// Result of `(void)`
    Void,
    Closure(Rc<Closure>),
    /// Placeholder held by a `letrec` binding until its initializer has been
    /// assigned. User code can only observe it by reading a sibling binding
    /// from inside a `letrec` initializer.
    Uninitialized,
    /// Returned to the caller of [`crate::evaluator::evaluate`] when `(exit)` runs
    Termination,
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Integer(_) => ValueTag::Integer,
            Value::Boolean(_) => ValueTag::Boolean,
            Value::Symbol(_) => ValueTag::Symbol,
            Value::Pair(_) => ValueTag::Pair,
            Value::EmptyList => ValueTag::EmptyList,
            Value::Void => ValueTag::Void,
            Value::Closure(_) => ValueTag::Closure,
            Value::Uninitialized => ValueTag::Uninitialized,
            Value::Termination => ValueTag::Termination,
        }
    }

    /// Everything except `#f` counts as true
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    /// `eq?` semantics.
    ///
    /// Integers, booleans and symbols compare by value. Pairs and closures
    /// compare by identity. The payload-less variants each have a single
    /// instance, so two of the same tag are the same object. Values with
    /// different tags are never the same object.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::EmptyList, Value::EmptyList)
            | (Value::Void, Value::Void)
            | (Value::Uninitialized, Value::Uninitialized)
            | (Value::Termination, Value::Termination) => true,
            _ => false,
        }
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            Value::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Check if a value is the empty list
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::EmptyList)
    }
}

/// Structural equality, used by tests and embedders.
///
/// Pairs compare element-wise; closures only equal themselves. For the
/// language-level identity test see [`Value::is_same`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Pair(a), Value::Pair(b)) => {
                let (mut a, mut b) = (a, b);
                loop {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.car != b.car {
                        return false;
                    }
                    match (&a.cdr, &b.cdr) {
                        (Value::Pair(next_a), Value::Pair(next_b)) => {
                            a = next_a;
                            b = next_b;
                        }
                        (tail_a, tail_b) => return tail_a == tail_b,
                    }
                }
            }
            _ => self.is_same(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(n as NumberType)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

/// Vectors become proper lists
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        list(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        list(arr.into_iter().map(Into::into))
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
pub fn nil() -> Value {
    Value::EmptyList
}

pub fn cons(car: Value, cdr: Value) -> Value {
    Value::Pair(Rc::new(Pair { car, cdr }))
}

/// Build a proper list, terminated by the empty list
pub fn list<I>(items: I) -> Value
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: DoubleEndedIterator,
{
    items
        .into_iter()
        .rev()
        .fold(Value::EmptyList, |tail, item| cons(item, tail))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::EmptyList => write!(f, "()"),
            Value::Void => write!(f, "#<void>"),
            Value::Closure(_) => write!(f, "#<procedure>"),
            Value::Uninitialized => write!(f, "#<uninitialized>"),
            Value::Termination => write!(f, "#<exit>"),
            Value::Pair(pair) => {
                write!(f, "({}", pair.car)?;
                // walk the spine iteratively so long lists don't recurse on cdr
                let mut tail = &pair.cdr;
                loop {
                    match tail {
                        Value::EmptyList => break,
                        Value::Pair(next) => {
                            write!(f, " {}", next.car)?;
                            tail = &next.cdr;
                        }
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}
