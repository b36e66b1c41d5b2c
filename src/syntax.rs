//! Reader output. A [`Syntax`] tree is what the resolver consumes; apart from
//! the datum held by a `quote` expression it is discarded after resolution.

use std::fmt;

use crate::ast::NumberType;

#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Number(NumberType),
    Identifier(String),
    True,
    False,
    List(Vec<Syntax>),
}

impl Syntax {
    pub fn ident<S: AsRef<str>>(name: S) -> Syntax {
        Syntax::Identifier(name.as_ref().to_owned())
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Syntax::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Syntax]> {
        match self {
            Syntax::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<NumberType> for Syntax {
    fn from(n: NumberType) -> Self {
        Syntax::Number(n)
    }
}

impl From<bool> for Syntax {
    fn from(b: bool) -> Self {
        if b { Syntax::True } else { Syntax::False }
    }
}

impl From<Vec<Syntax>> for Syntax {
    fn from(items: Vec<Syntax>) -> Self {
        Syntax::List(items)
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Number(n) => write!(f, "{n}"),
            Syntax::Identifier(name) => write!(f, "{name}"),
            Syntax::True => write!(f, "#t"),
            Syntax::False => write!(f, "#f"),
            Syntax::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
