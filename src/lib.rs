//! minischeme - a small Scheme-like language with a separate resolution pass
//!
//! Source text goes through three stages before it becomes a value:
//!
//! ```text
//! text --(scheme::parse_scheme)--> Syntax
//!      --(resolver::resolve)-----> Expr
//!      --(evaluator::evaluate)---> Value
//! ```
//!
//! The resolver looks at the environment in effect to decide whether an
//! identifier denotes a variable, a special form or a primitive operator, and
//! validates the shape of every special form. The evaluator then walks the
//! resolved tree against a persistent lexical [`environment::Environment`].
//!
//! ```scheme
//! (letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
//!          (odd?  (lambda (n) (if (= n 0) #f (even? (- n 1))))))
//!   (even? 10))                 ; => #t
//! (let ((+ (lambda (a b) a))) (+ 1 2))   ; => 1, bound names shadow primitives
//! (if 0 'yes 'no)               ; => yes, only #f is false
//! (car (quote (1 #t a)))        ; => 1
//! ```
//!
//! ## Semantics at a glance
//!
//! - Integers are `i64` with wrapping arithmetic
//! - Primitives are strict: `(car 1)` fails with `car: type error.`
//! - Keywords and primitives are not first-class: a bare `+` is a syntax error
//! - Closures must be applied to exactly as many arguments as they have parameters
//! - `(exit)` unwinds to the caller as [`ast::Value::Termination`]
//!
//! ## Modules
//!
//! - `ast`: runtime values
//! - `syntax`: reader output consumed by the resolver
//! - `environment`: persistent frame chain shared by closures
//! - `builtinops`: keyword and primitive registries
//! - `expr`: resolved expression tree
//! - `resolver`: Syntax to Expr
//! - `evaluator`: Expr to Value
//! - `scheme`: S-expression reader (feature `scheme`)

use std::fmt;

/// Maximum nesting depth accepted by the reader
pub const MAX_PARSE_DEPTH: usize = 128;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed parens)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
    /// Integer literal does not fit the fixnum range
    ImplementationLimit,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        // The snippet is cut in chars, so the byte offset is converted first
        let total_chars = input.chars().count();
        let error_char = input
            .get(..error_offset)
            .map_or(total_chars, |prefix| prefix.chars().count());
        let context_start = error_char.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < total_chars {
            display_context.push_str("[...]");
        }
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        let found = input
            .get(error_offset..)
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_owned);

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Error type shared by the reader, the resolver and the evaluator
///
/// `SyntaxError` and resolution-time `ArityError`s are structural: the input
/// has the wrong shape. The remaining variants come from evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
    /// Malformed special form, quoting error, or keyword used outside call position
    SyntaxError(String),
    /// Operand of the named operator has the wrong type
    TypeError(String),
    UnboundVariable(String),
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>,
    },
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError naming the form or procedure involved
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }

    pub(crate) fn type_error(op: &str) -> Self {
        Error::TypeError(op.to_owned())
    }

    pub(crate) fn syntax_error(message: impl Into<String>) -> Self {
        Error::SyntaxError(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::SyntaxError(msg) => write!(f, "SyntaxError: {msg}"),
            Error::TypeError(op) => write!(f, "{op}: type error."),
            Error::UnboundVariable(var) => write!(f, "{var}: undefined."),
            Error::ArityError {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityError: {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityError: procedure expected {expected} arguments but got {got}"
                ),
            },
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::ParseError(e)
    }
}

pub mod ast;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod expr;
pub mod resolver;
pub mod syntax;

#[cfg(feature = "scheme")]
pub mod scheme;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_context_snippets() {
        let test_cases = vec![
            // (input, error byte offset, expected context, expected found)
            ("(a ]", 3, "(a ]", Some("]")),
            ("(λ ]", 4, "(λ ]", Some("]")),
            ("(λ)", 4, "(λ)", None),
        ];
        for (input, offset, context, found) in test_cases {
            let err = ParseError::with_context(ParseErrorKind::InvalidSyntax, "x", input, offset);
            assert_eq!(err.context.as_deref(), Some(context), "{input}");
            assert_eq!(err.found.as_deref(), found, "{input}");
        }
    }

    #[test]
    fn test_parse_error_context_counts_chars_not_bytes() {
        // thirty two-byte chars, then the offending token
        let input = format!("{} ]", "λ".repeat(30));
        let offset = input.find(']').unwrap_or_default();
        let err = ParseError::with_context(ParseErrorKind::InvalidSyntax, "x", &input, offset);

        let expected = format!("[...]{} ]", "λ".repeat(19));
        assert_eq!(err.context.as_deref(), Some(expected.as_str()));
        assert_eq!(err.found.as_deref(), Some("]"));

        // a long tail past the snippet is marked as elided
        let input = format!("( ]{}", "λ".repeat(150));
        let err = ParseError::with_context(ParseErrorKind::InvalidSyntax, "x", &input, 2);
        let context = err.context.unwrap_or_default();
        assert!(!context.starts_with("[...]"));
        assert!(context.ends_with("[...]"));
        assert_eq!(context.chars().count(), 100 + "[...]".len());
    }
}
