//! Expression evaluation.
//!
//! Evaluation is a plain recursive walk of the resolved tree with no tail-call
//! elimination, so deeply recursive programs use native stack in proportion to
//! their recursion depth.
//!
//! `(exit)` does not terminate the process. It unwinds through every pending
//! frame as an internal signal, and [`evaluate`] reports it to the caller as
//! [`Value::Termination`]. Hosts decide what stopping means.

use std::rc::Rc;

use log::{debug, trace};

use crate::Error;
use crate::ast::{Closure, Value, list};
use crate::environment::Environment;
use crate::expr::{Binding, Expr};
use crate::syntax::Syntax;

/// Why evaluation stopped before producing a value
#[derive(Debug)]
enum Unwind {
    Error(Error),
    Exit,
}

impl From<Error> for Unwind {
    fn from(err: Error) -> Self {
        Unwind::Error(err)
    }
}

type EvalResult = Result<Value, Unwind>;

/// Evaluate a resolved expression against `env`.
///
/// Returns `Ok(Value::Termination)` if `(exit)` was evaluated anywhere inside
/// `expr`; evaluation stops at that point.
pub fn evaluate(expr: &Expr, env: &Environment) -> Result<Value, Error> {
    match eval_expr(expr, env) {
        Ok(value) => Ok(value),
        Err(Unwind::Exit) => Ok(Value::Termination),
        Err(Unwind::Error(err)) => Err(err),
    }
}

/// Parse, resolve and evaluate one datum of source text
#[cfg(feature = "scheme")]
pub fn eval_str(source: &str, env: &Environment) -> Result<Value, Error> {
    let syntax = crate::scheme::parse_scheme(source)?;
    let expr = crate::resolver::resolve(&syntax, env)?;
    evaluate(&expr, env)
}

fn eval_expr(expr: &Expr, env: &Environment) -> EvalResult {
    match expr {
        Expr::Var(name) => env
            .find(name)
            .ok_or_else(|| Error::UnboundVariable(name.clone()).into()),
        Expr::Fixnum(n) => Ok(Value::Integer(*n)),
        Expr::True => Ok(Value::Boolean(true)),
        Expr::False => Ok(Value::Boolean(false)),
        Expr::Lambda { params, body } => Ok(Value::Closure(Rc::new(Closure {
            params: Rc::clone(params),
            body: Rc::clone(body),
            env: env.clone(),
        }))),
        Expr::Let { bindings, body } => eval_let(bindings, body, env),
        Expr::Letrec { bindings, body } => eval_letrec(bindings, body, env),
        Expr::Apply { rator, rands } => eval_apply(rator, rands, env),
        Expr::If {
            cond,
            conseq,
            alter,
        } => {
            if eval_expr(cond, env)?.is_truthy() {
                eval_expr(conseq, env)
            } else {
                eval_expr(alter, env)
            }
        }
        Expr::Begin(exprs) => {
            let mut result = Value::Void;
            for expr in exprs {
                result = eval_expr(expr, env)?;
            }
            Ok(result)
        }
        Expr::Quote(datum) => Ok(quote_datum(datum)),
        Expr::MakeVoid => Ok(Value::Void),
        Expr::Exit => {
            debug!("exit requested, unwinding");
            Err(Unwind::Exit)
        }
        Expr::KeywordRef(op) => Err(Error::syntax_error(format!(
            "{} is a keyword and cannot be used as a value",
            op.scheme_id
        ))
        .into()),
        Expr::Unary { func, operand, .. } => {
            let operand = eval_expr(operand, env)?;
            Ok(func(&operand)?)
        }
        Expr::Binary { func, lhs, rhs, .. } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            Ok(func(&lhs, &rhs)?)
        }
    }
}

fn eval_all<'a, I>(exprs: I, env: &Environment) -> Result<Vec<Value>, Unwind>
where
    I: IntoIterator<Item = &'a Expr>,
{
    exprs.into_iter().map(|expr| eval_expr(expr, env)).collect()
}

fn eval_let(bindings: &[Binding], body: &Expr, env: &Environment) -> EvalResult {
    // All initializers run in the outer environment before any name is bound
    let values = eval_all(bindings.iter().map(|(_, init)| init), env)?;
    let scope = bindings
        .iter()
        .zip(values)
        .fold(env.clone(), |scope, ((name, _), value)| {
            scope.extend(name.as_str(), value)
        });
    eval_expr(body, &scope)
}

fn eval_letrec(bindings: &[Binding], body: &Expr, env: &Environment) -> EvalResult {
    let scope = bindings.iter().fold(env.clone(), |scope, (name, _)| {
        scope.extend(name.as_str(), Value::Uninitialized)
    });

    // An initializer that reads a sibling before the back-patch below sees
    // Value::Uninitialized rather than failing.
    let values = eval_all(bindings.iter().map(|(_, init)| init), &scope)?;
    for ((name, _), value) in bindings.iter().zip(values) {
        let assigned = scope.modify(name, value);
        debug_assert!(assigned, "letrec binding `{name}` missing from its own scope");
        debug!("letrec: assigned `{name}`");
    }

    eval_expr(body, &scope)
}

fn eval_apply(rator: &Expr, rands: &[Expr], env: &Environment) -> EvalResult {
    let Value::Closure(closure) = eval_expr(rator, env)? else {
        return Err(Error::type_error("apply").into());
    };

    // The count is checked before any argument is evaluated
    if closure.params.len() != rands.len() {
        return Err(Error::arity_error_with_expr(
            closure.params.len(),
            rands.len(),
            format!("{rator:?}"),
        )
        .into());
    }

    let args = eval_all(rands, env)?;
    trace!("applying {rator:?} to {} argument(s)", args.len());

    // Parameters extend the environment captured by the closure, not the caller's
    let scope = closure
        .params
        .iter()
        .zip(args)
        .fold(closure.env.clone(), |scope, (param, arg)| {
            scope.extend(param.as_str(), arg)
        });
    eval_expr(&closure.body, &scope)
}

/// Rebuild a quoted datum as data: lists become pair chains, identifiers symbols
fn quote_datum(datum: &Syntax) -> Value {
    match datum {
        Syntax::Number(n) => Value::Integer(*n),
        Syntax::True => Value::Boolean(true),
        Syntax::False => Value::Boolean(false),
        Syntax::Identifier(name) => Value::Symbol(name.clone()),
        Syntax::List(items) => list(items.iter().map(quote_datum)),
    }
}
