//! Property value units, run over a raw declaration value or raw function
//! arguments during refinement.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize},
    sequence::pair,
};

use crate::ast::{
    FunctionValue, PropertyValue, RawSpan, Syntax, Term, TermKind, ValueMember, shared,
};
use crate::broadcast::{Broadcaster, QueryableBroadcaster};
use crate::cursor::Cursor;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::grammar::Grammar;
use crate::tokens::Token;

fn parse_number(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)
}

fn parse_unit(input: &str) -> IResult<&str, &str> {
    alt((tag("%"), take_while1(|c: char| c.is_ascii_alphabetic())))(input)
}

fn parse_numeric(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    pair(parse_number, opt(parse_unit))(input)
}

fn emit_term(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    position: Position,
    kind: TermKind,
) -> Result<bool> {
    let mut term = Term::new(position, kind);
    term.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(term)))?;
    Ok(true)
}

/// A full property value: one or more members, optionally followed by
/// `!important`.
pub fn property_value(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    cursor.skip_whitespace();
    cursor.collect_comments(true)?;
    let position = cursor.position();

    let members = members(cursor, sink, grammar)?;

    cursor.skip_whitespace();
    cursor.collect_comments(true)?;
    let important = important(cursor)?;

    if members.is_empty() && !important {
        return Ok(false);
    }

    let mut value = PropertyValue::new(position);
    value.members = members;
    value.important = important;
    sink.broadcast(Syntax::from(shared(value)))?;
    Ok(true)
}

/// Reads value members until none match. Returns the members in source
/// order; each one has already been broadcast.
pub fn members(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<Vec<ValueMember>> {
    let mut query = QueryableBroadcaster::new(sink);

    loop {
        cursor.skip_whitespace();
        cursor.collect_comments(true)?;
        if cursor.eof() || !member(cursor, &mut query, grammar)? {
            break;
        }
    }

    Ok(query
        .into_received()
        .iter()
        .filter_map(ValueMember::from_syntax)
        .collect())
}

/// Any single value member.
pub fn member(cursor: &mut Cursor, sink: &mut dyn Broadcaster, grammar: &Grammar) -> Result<bool> {
    Ok(string_term(cursor, sink, grammar)?
        || hex_color(cursor, sink, grammar)?
        || numeric(cursor, sink, grammar)?
        || function(cursor, sink, grammar)?
        || keyword(cursor, sink, grammar)?
        || operator(cursor, sink, grammar)?)
}

pub fn string_term(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    let Some(quote) = cursor.current() else {
        return Ok(false);
    };
    let Some(token) = Token::quote_for(quote) else {
        return Ok(false);
    };

    let content = cursor.chomp_enclosed_value(token, token)?;
    emit_term(cursor, sink, position, TermKind::String { quote, content })
}

/// `#` followed by 3, 4, 6 or 8 hex digits.
pub fn hex_color(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::Hash) {
        return Ok(false);
    }

    let hex = cursor.chomp(Token::NameChar);
    let valid = matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(CssError::new(ErrorCode::InvalidHexColor(hex), position));
    }
    emit_term(cursor, sink, position, TermKind::HexColor(hex))
}

/// A number with an optional unit or percent sign, e.g. `-1.5em`, `.5`,
/// `100%`.
pub fn numeric(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    let remaining = cursor.remaining();
    let Ok((rest, (number, unit))) = parse_numeric(&remaining) else {
        return Ok(false);
    };
    let Ok(value) = number.parse::<f64>() else {
        return Ok(false);
    };

    let consumed = remaining[..remaining.len() - rest.len()].chars().count();
    cursor.forward(cursor.index() + consumed)?;

    let unit = unit.map(str::to_string);
    emit_term(cursor, sink, position, TermKind::Numeric { value, unit })
}

/// An identifier immediately followed by `(`. The arguments are kept raw.
pub fn function(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let snapshot = cursor.snapshot();
    let Some(name) = cursor.read_ident() else {
        return Ok(false);
    };
    if !Token::OpenParen.matches(cursor.current()) {
        cursor.restore(snapshot);
        return Ok(false);
    }

    let open = cursor.position();
    let args = cursor.chomp_enclosed_value(Token::OpenParen, Token::CloseParen)?;
    let raw = RawSpan::new(Position::new(open.line, open.column + 1), args);

    let mut function = FunctionValue::raw(snapshot.position(), name, raw);
    function.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(function)))?;
    Ok(true)
}

pub fn keyword(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    match cursor.read_ident() {
        Some(keyword) => emit_term(cursor, sink, position, TermKind::Keyword(keyword)),
        None => Ok(false),
    }
}

/// `,` or `/`.
pub fn operator(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    match cursor.optional(Token::AnyOf(",/")) {
        Some(op) => emit_term(cursor, sink, position, TermKind::Operator(op)),
        None => Ok(false),
    }
}

/// `!important`, case-insensitive, with optional whitespace after the `!`.
pub fn important(cursor: &mut Cursor) -> Result<bool> {
    if !cursor.optionally_present(Token::Exclamation) {
        return Ok(false);
    }
    cursor.skip_whitespace();
    match cursor.read_ident() {
        Some(ident) if ident.eq_ignore_ascii_case("important") => Ok(true),
        _ => Err(cursor.error(ErrorCode::ExpectedImportant)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(source: &str) -> (Vec<String>, bool) {
        let mut cursor = Cursor::new(source);
        let mut sink = QueryableBroadcaster::detached();
        assert!(property_value(&mut cursor, &mut sink, &Grammar::default()).unwrap());
        let value = sink.find::<PropertyValue>().unwrap();
        let value = value.borrow();
        let members = value.members.iter().map(|m| m.to_string()).collect();
        (members, value.important)
    }

    #[test]
    fn nom_numeric() {
        assert_eq!(parse_numeric("1.5em x"), Ok((" x", ("1.5", Some("em")))));
        assert_eq!(parse_numeric("-.5"), Ok(("", ("-.5", None))));
        assert_eq!(parse_numeric("50%;"), Ok((";", ("50", Some("%")))));
        assert!(parse_numeric("-webkit").is_err());
    }

    #[test]
    fn mixed_terms() {
        let (members, important) = terms("1px solid #FFF !important");
        assert_eq!(members, ["1px", "solid", "#FFF"]);
        assert!(important);
    }

    #[test]
    fn operators_and_strings() {
        let (members, important) = terms("'Helvetica Neue', sans-serif / 2");
        assert_eq!(members, ["'Helvetica Neue'", ",", "sans-serif", "/", "2"]);
        assert!(!important);
    }

    #[test]
    fn functions_keep_raw_args() {
        let mut cursor = Cursor::new("rgba(0, 0, 0, .5) url( 'a.png' )");
        let members = members(&mut cursor, &mut Vec::<Syntax>::new(), &Grammar::default()).unwrap();
        assert_eq!(members.len(), 2);
        let ValueMember::Function(first) = &members[0] else {
            panic!("expected a function");
        };
        let raw = first.borrow().raw_args.clone().unwrap();
        assert_eq!(raw.content, "0, 0, 0, .5");
        assert_eq!(raw.position(), Position::new(1, 6));
    }

    #[test]
    fn invalid_hex_color() {
        let mut cursor = Cursor::new("#ggg");
        let err =
            hex_color(&mut cursor, &mut Vec::<Syntax>::new(), &Grammar::default()).unwrap_err();
        assert_eq!(err.code(), &ErrorCode::InvalidHexColor("ggg".into()));
    }

    #[test]
    fn bad_important() {
        let mut cursor = Cursor::new("red !imp");
        let mut sink = QueryableBroadcaster::detached();
        let err = property_value(&mut cursor, &mut sink, &Grammar::default()).unwrap_err();
        assert_eq!(err.code(), &ErrorCode::ExpectedImportant);
    }
}
