//! Resolved expression tree.
//!
//! An [`Expr`] is produced once by [`crate::resolver::resolve`] and is
//! immutable afterwards. Lambda bodies are reference counted so that every
//! closure created from the same `lambda` shares one body.

use std::fmt;
use std::rc::Rc;

use crate::ast::NumberType;
use crate::builtinops::{BinaryFn, BuiltinOp, UnaryFn};
use crate::syntax::Syntax;

/// A `(name initializer)` pair of `let` or `letrec`
pub type Binding = (String, Expr);

pub enum Expr {
    Var(String),
    Fixnum(NumberType),
    True,
    False,
    Lambda {
        params: Rc<[String]>,
        body: Rc<Expr>,
    },
    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    Letrec {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },
    Apply {
        rator: Box<Expr>,
        rands: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        conseq: Box<Expr>,
        alter: Box<Expr>,
    },
    Begin(Vec<Expr>),
    /// Datum kept verbatim; turned into values each time it is evaluated
    Quote(Syntax),
    MakeVoid,
    Exit,
    /// A keyword or primitive name outside call position
    KeywordRef(&'static BuiltinOp),
    Unary {
        op: &'static str,
        func: UnaryFn,
        operand: Box<Expr>,
    },
    Binary {
        op: &'static str,
        func: BinaryFn,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn var<S: AsRef<str>>(name: S) -> Expr {
        Expr::Var(name.as_ref().to_owned())
    }
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[Binding]) -> fmt::Result {
    write!(f, "(")?;
    for (i, (name, init)) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({name} {init:?})")?;
    }
    write!(f, ")")
}

/// Prints the expression back in surface syntax, which keeps test failures readable
impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Fixnum(n) => write!(f, "{n}"),
            Expr::True => write!(f, "#t"),
            Expr::False => write!(f, "#f"),
            Expr::Lambda { params, body } => {
                write!(f, "(lambda ({}) {body:?})", params.join(" "))
            }
            Expr::Let { bindings, body } => {
                write!(f, "(let ")?;
                write_bindings(f, bindings)?;
                write!(f, " {body:?})")
            }
            Expr::Letrec { bindings, body } => {
                write!(f, "(letrec ")?;
                write_bindings(f, bindings)?;
                write!(f, " {body:?})")
            }
            Expr::Apply { rator, rands } => {
                write!(f, "({rator:?}")?;
                for rand in rands {
                    write!(f, " {rand:?}")?;
                }
                write!(f, ")")
            }
            Expr::If {
                cond,
                conseq,
                alter,
            } => write!(f, "(if {cond:?} {conseq:?} {alter:?})"),
            Expr::Begin(exprs) => {
                write!(f, "(begin")?;
                for expr in exprs {
                    write!(f, " {expr:?}")?;
                }
                write!(f, ")")
            }
            Expr::Quote(datum) => write!(f, "(quote {datum})"),
            Expr::MakeVoid => write!(f, "(void)"),
            Expr::Exit => write!(f, "(exit)"),
            Expr::KeywordRef(op) => write!(f, "#<keyword:{}>", op.scheme_id),
            Expr::Unary { op, operand, .. } => write!(f, "({op} {operand:?})"),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({op} {lhs:?} {rhs:?})"),
        }
    }
}
