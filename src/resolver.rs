//! Syntax to expression resolution.
//!
//! Resolution decides what every identifier denotes before anything runs:
//!
//! 1. a name bound in the environment in effect is a variable, even when it is
//!    spelled like a keyword or primitive (`(let ((car 1)) car)` is fine);
//! 2. otherwise a primitive or reserved word is a [`Expr::KeywordRef`], which
//!    is only meaningful as the head of a list;
//! 3. otherwise it is a free variable, which may still be undefined when it is
//!    evaluated.
//!
//! The environment is only asked whether names are bound. Binding forms
//! extend a scratch copy of it with [`Value::Uninitialized`] placeholders so
//! that their bodies see the new names as variables.

use log::trace;

use crate::Error;
use crate::ast::Value;
use crate::builtinops::{BuiltinOp, FormKind, OpKind, find_keyword};
use crate::environment::Environment;
use crate::expr::{Binding, Expr};
use crate::syntax::Syntax;

/// Resolve a syntax tree against the names bound in `env`
pub fn resolve(syntax: &Syntax, env: &Environment) -> Result<Expr, Error> {
    match syntax {
        Syntax::Number(n) => Ok(Expr::Fixnum(*n)),
        Syntax::True => Ok(Expr::True),
        Syntax::False => Ok(Expr::False),
        Syntax::Identifier(name) => Ok(resolve_identifier(name, env)),
        Syntax::List(items) => resolve_list(items, env),
    }
}

fn resolve_identifier(name: &str, env: &Environment) -> Expr {
    if env.is_bound(name) {
        if find_keyword(name).is_some() {
            trace!("bound variable `{name}` shadows a keyword");
        }
        return Expr::var(name);
    }
    match find_keyword(name) {
        Some(op) => Expr::KeywordRef(op),
        None => Expr::var(name),
    }
}

fn resolve_list(items: &[Syntax], env: &Environment) -> Result<Expr, Error> {
    let [head, args @ ..] = items else {
        return Ok(Expr::Quote(Syntax::List(Vec::new())));
    };

    match resolve(head, env)? {
        Expr::KeywordRef(op) => resolve_form(op, args, env),
        rator => {
            // A literal lambda in operator position is checked now; any other
            // operator is checked when it is applied.
            if let Expr::Lambda { params, .. } = &rator
                && params.len() != args.len()
            {
                return Err(Error::arity_error_with_expr(
                    params.len(),
                    args.len(),
                    format!("{rator:?}"),
                ));
            }
            let rands = args
                .iter()
                .map(|arg| resolve(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Apply {
                rator: Box::new(rator),
                rands,
            })
        }
    }
}

fn resolve_form(op: &'static BuiltinOp, args: &[Syntax], env: &Environment) -> Result<Expr, Error> {
    op.validate_arity(args.len())?;

    match (op.op_kind, args) {
        (OpKind::Unary(func), [operand]) => Ok(Expr::Unary {
            op: op.scheme_id,
            func,
            operand: Box::new(resolve(operand, env)?),
        }),
        (OpKind::Binary(func), [lhs, rhs]) => Ok(Expr::Binary {
            op: op.scheme_id,
            func,
            lhs: Box::new(resolve(lhs, env)?),
            rhs: Box::new(resolve(rhs, env)?),
        }),
        (OpKind::SpecialForm(FormKind::Let), [bindings, body]) => resolve_let(bindings, body, env),
        (OpKind::SpecialForm(FormKind::Letrec), [bindings, body]) => {
            resolve_letrec(bindings, body, env)
        }
        (OpKind::SpecialForm(FormKind::Lambda), [params, body]) => {
            resolve_lambda(params, body, env)
        }
        (OpKind::SpecialForm(FormKind::If), [cond, conseq, alter]) => Ok(Expr::If {
            cond: Box::new(resolve(cond, env)?),
            conseq: Box::new(resolve(conseq, env)?),
            alter: Box::new(resolve(alter, env)?),
        }),
        (OpKind::SpecialForm(FormKind::Begin), exprs) => exprs
            .iter()
            .map(|expr| resolve(expr, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::Begin),
        (OpKind::SpecialForm(FormKind::Quote), [datum]) => Ok(Expr::Quote(datum.clone())),
        (OpKind::SpecialForm(FormKind::Void), []) => Ok(Expr::MakeVoid),
        (OpKind::SpecialForm(FormKind::Exit), []) => Ok(Expr::Exit),
        _ => Err(Error::syntax_error(format!("{}: bad syntax", op.scheme_id))),
    }
}

/// Split `((name init) ...)` into names and unresolved initializers
fn binding_pairs<'a>(
    form: &str,
    bindings: &'a Syntax,
) -> Result<Vec<(&'a str, &'a Syntax)>, Error> {
    let Some(items) = bindings.as_list() else {
        return Err(Error::syntax_error(format!(
            "{form}: expected a list of bindings, got {bindings}"
        )));
    };

    items
        .iter()
        .map(|binding| match binding.as_list() {
            Some([name, init]) => match name.as_identifier() {
                Some(name) => Ok((name, init)),
                None => Err(Error::syntax_error(format!(
                    "{form}: binding name must be an identifier, got {name}"
                ))),
            },
            _ => Err(Error::syntax_error(format!(
                "{form}: binding must have the form (name expr), got {binding}"
            ))),
        })
        .collect()
}

fn scope_with<'a, I>(env: &Environment, names: I) -> Environment
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .fold(env.clone(), |scope, name| scope.extend(name, Value::Uninitialized))
}

fn resolve_let(bindings: &Syntax, body: &Syntax, env: &Environment) -> Result<Expr, Error> {
    let pairs = binding_pairs("let", bindings)?;

    // Initializers see only the outer scope
    let bindings = pairs
        .iter()
        .map(|(name, init)| -> Result<Binding, Error> {
            Ok(((*name).to_owned(), resolve(init, env)?))
        })
        .collect::<Result<Vec<Binding>, Error>>()?;

    let scope = scope_with(env, pairs.iter().map(|(name, _)| *name));
    Ok(Expr::Let {
        bindings,
        body: Box::new(resolve(body, &scope)?),
    })
}

fn resolve_letrec(bindings: &Syntax, body: &Syntax, env: &Environment) -> Result<Expr, Error> {
    let pairs = binding_pairs("letrec", bindings)?;

    // Every name is in scope before any initializer is resolved
    let scope = scope_with(env, pairs.iter().map(|(name, _)| *name));
    let bindings = pairs
        .iter()
        .map(|(name, init)| -> Result<Binding, Error> {
            Ok(((*name).to_owned(), resolve(init, &scope)?))
        })
        .collect::<Result<Vec<Binding>, Error>>()?;

    Ok(Expr::Letrec {
        bindings,
        body: Box::new(resolve(body, &scope)?),
    })
}

fn resolve_lambda(params: &Syntax, body: &Syntax, env: &Environment) -> Result<Expr, Error> {
    let Some(items) = params.as_list() else {
        return Err(Error::syntax_error(format!(
            "lambda: expected a parameter list, got {params}"
        )));
    };

    let params = items
        .iter()
        .map(|param| {
            param.as_identifier().map(str::to_owned).ok_or_else(|| {
                Error::syntax_error(format!("lambda: parameter must be an identifier, got {param}"))
            })
        })
        .collect::<Result<Vec<String>, Error>>()?;

    let scope = scope_with(env, params.iter().map(String::as_str));
    Ok(Expr::Lambda {
        params: params.into(),
        body: resolve(body, &scope)?.into(),
    })
}
