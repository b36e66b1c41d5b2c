use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1, not_line_ending, satisfy},
    combinator::{cut, not, value},
    error::ErrorKind,
    multi::many0_count,
    sequence::{preceded, terminated},
};

use crate::ast::NumberType;
use crate::syntax::Syntax;
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Characters besides alphanumerics that may appear in an identifier
const IDENTIFIER_SPECIAL_CHARS: &str = "+-*/<>=!?_$.";

/// Reader options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseConfig {
    /// Treat `;` to end of line as whitespace
    pub handle_comments: bool,
}

type ParseResult<'a, T> = IResult<&'a str, T>;

fn fail<T>(input: &str, kind: ErrorKind) -> ParseResult<'_, T> {
    Err(nom::Err::Failure(nom::error::Error::new(input, kind)))
}

fn is_atom_char(c: char) -> bool {
    c.is_alphanumeric() || IDENTIFIER_SPECIAL_CHARS.contains(c)
}

fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Skip whitespace, and comments when enabled
fn atmosphere(input: &str, config: ParseConfig) -> ParseResult<'_, ()> {
    if config.handle_comments {
        value(
            (),
            many0_count(alt((multispace1, preceded(char(';'), not_line_ending)))),
        )
        .parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

/// Parse `#t` or `#f`
fn parse_boolean(input: &str) -> ParseResult<'_, Syntax> {
    terminated(
        alt((
            value(Syntax::True, tag("#t")),
            value(Syntax::False, tag("#f")),
        )),
        not(satisfy(is_atom_char)),
    )
    .parse(input)
}

/// Parse a number or an identifier.
///
/// A token that is entirely an optionally negated run of decimal digits is a
/// number; any other token is an identifier, so `-` and `1+` are identifiers.
fn parse_atom(input: &str) -> ParseResult<'_, Syntax> {
    let (rest, token) = take_while1(is_atom_char).parse(input)?;

    if is_integer_literal(token) {
        return match token.parse::<NumberType>() {
            Ok(n) => Ok((rest, Syntax::Number(n))),
            Err(_) => fail(input, ErrorKind::Digit),
        };
    }
    Ok((rest, Syntax::Identifier(token.to_owned())))
}

/// Parse quoted datum ('d -> (quote d))
fn parse_quote(input: &str, config: ParseConfig, depth: usize) -> ParseResult<'_, Syntax> {
    let (input, _) = char('\'').parse(input)?;
    let (input, datum) = cut(|input| parse_datum(input, config, depth + 1)).parse(input)?;
    Ok((input, Syntax::List(vec![Syntax::ident("quote"), datum])))
}

/// Parse a list delimited by `(...)` or `[...]`; the closing delimiter must match
fn parse_list(input: &str, config: ParseConfig, depth: usize) -> ParseResult<'_, Syntax> {
    let (mut input, open) = alt((char('('), char('['))).parse(input)?;
    let close = if open == '(' { ')' } else { ']' };
    let mut items = Vec::new();

    loop {
        let (rest, ()) = atmosphere(input, config)?;
        if let Some(rest) = rest.strip_prefix(close) {
            return Ok((rest, Syntax::List(items)));
        }
        let (rest, item) = cut(|input| parse_datum(input, config, depth + 1)).parse(rest)?;
        items.push(item);
        input = rest;
    }
}

fn parse_datum(input: &str, config: ParseConfig, depth: usize) -> ParseResult<'_, Syntax> {
    if depth >= MAX_PARSE_DEPTH {
        return fail(input, ErrorKind::TooLarge);
    }
    let (input, ()) = atmosphere(input, config)?;
    if input.is_empty() {
        return fail(input, ErrorKind::Eof);
    }

    alt((
        |input| parse_quote(input, config, depth),
        |input| parse_list(input, config, depth),
        parse_boolean,
        parse_atom,
    ))
    .parse(input)
}

/// Convert a nom failure into a ParseError pointing at the offending input
fn describe_failure(input: &str, error: &nom::error::Error<&str>) -> ParseError {
    let offset = input.len().saturating_sub(error.input.len());
    let (kind, message) = match error.code {
        ErrorKind::Eof => (ParseErrorKind::Incomplete, "unexpected end of input".to_owned()),
        ErrorKind::TooLarge => (
            ParseErrorKind::TooDeeplyNested,
            format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
        ),
        ErrorKind::Digit => (
            ParseErrorKind::ImplementationLimit,
            format!(
                "integer literal outside the range {}..={}",
                NumberType::MIN,
                NumberType::MAX
            ),
        ),
        _ => (ParseErrorKind::InvalidSyntax, "invalid syntax".to_owned()),
    };
    ParseError::with_context(kind, message, input, offset)
}

/// Read exactly one datum from `input` with default options.
pub fn parse_scheme(input: &str) -> Result<Syntax, Error> {
    parse_scheme_with_config(input, ParseConfig::default())
}

/// Read exactly one datum from `input`.
///
/// Surrounding whitespace is ignored; anything else after the datum is a
/// [`ParseErrorKind::TrailingContent`] error.
pub fn parse_scheme_with_config(input: &str, config: ParseConfig) -> Result<Syntax, Error> {
    match terminated(
        |input| parse_datum(input, config, 0),
        |input| atmosphere(input, config),
    )
    .parse(input)
    {
        Ok(("", syntax)) => Ok(syntax),
        Ok((remaining, _)) => Err(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            "unexpected input after a complete expression",
            input,
            input.len() - remaining.len(),
        )
        .into()),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(describe_failure(input, &e).into()),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::from_message(
            ParseErrorKind::Incomplete,
            "unexpected end of input",
        )
        .into()),
    }
}
