//! Selector units, run over a raw selector during refinement.

use crate::ast::{
    AttributeMatch, CombinatorKind, SelectorPart, SelectorPartKind, Syntax, shared,
};
use crate::broadcast::Broadcaster;
use crate::cursor::Cursor;
use crate::error::{ErrorCode, Position, Result};
use crate::grammar::Grammar;
use crate::tokens::Token;

const ATTRIBUTE_OPERATORS: [&str; 6] = ["~=", "|=", "^=", "$=", "*=", "="];

fn emit(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    position: Position,
    kind: SelectorPartKind,
) -> Result<bool> {
    let mut part = SelectorPart::new(position, kind);
    part.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(part)))?;
    Ok(true)
}

/// A complex selector: compound selectors joined by combinators.
pub fn complex_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    cursor.collect_comments(true)?;

    if !compound_selector(cursor, sink, grammar)? {
        return Ok(false);
    }
    while combinator(cursor, sink, grammar)? {
        if !compound_selector(cursor, sink, grammar)? {
            return Err(cursor.error(ErrorCode::ExpectedSelectorAfterCombinator));
        }
    }
    Ok(true)
}

/// An optional type or universal selector followed by any number of id,
/// class, attribute and pseudo selectors, with nothing in between.
pub fn compound_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    let mut matched = keyframe_selector(cursor, sink, grammar)?
        || type_selector(cursor, sink, grammar)?
        || universal(cursor, sink, grammar)?;

    loop {
        let next = id_selector(cursor, sink, grammar)?
            || class_selector(cursor, sink, grammar)?
            || attribute_selector(cursor, sink, grammar)?
            || pseudo_selector(cursor, sink, grammar)?;
        if !next {
            break;
        }
        matched = true;
    }

    Ok(matched)
}

/// A keyframe offset such as `50%` or `12.5%`. The `from` and `to`
/// keywords read as type selectors.
pub fn keyframe_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    if !Token::Digit.matches(cursor.current()) {
        return Ok(false);
    }
    let position = cursor.position();
    let snapshot = cursor.snapshot();

    let mut offset = cursor.chomp(Token::Digit);
    if Token::Dot.matches(cursor.current()) && Token::Digit.matches(cursor.peek(1)) {
        cursor.next();
        offset.push('.');
        offset.push_str(&cursor.chomp(Token::Digit));
    }
    if !cursor.optionally_present(Token::Literal('%')) {
        cursor.restore(snapshot);
        return Ok(false);
    }
    emit(cursor, sink, position, SelectorPartKind::KeyframeOffset(offset))
}

pub fn type_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    match cursor.read_ident() {
        Some(name) => emit(cursor, sink, position, SelectorPartKind::Type(name)),
        None => Ok(false),
    }
}

pub fn universal(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::Star) {
        return Ok(false);
    }
    emit(cursor, sink, position, SelectorPartKind::Universal)
}

pub fn id_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::Hash) {
        return Ok(false);
    }
    let name = cursor
        .read_ident()
        .ok_or_else(|| cursor.error(ErrorCode::ExpectedIdName))?;
    emit(cursor, sink, position, SelectorPartKind::Id(name))
}

pub fn class_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::Dot) {
        return Ok(false);
    }
    let name = cursor
        .read_ident()
        .ok_or_else(|| cursor.error(ErrorCode::ExpectedClassName))?;
    emit(cursor, sink, position, SelectorPartKind::Class(name))
}

/// `[name]` or `[name op value]`. The value is kept as written, quotes and
/// flags included.
pub fn attribute_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    _grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::OpenBracket) {
        return Ok(false);
    }

    cursor.skip_whitespace();
    let name = cursor
        .read_ident()
        .ok_or_else(|| cursor.error(ErrorCode::ExpectedAttributeName))?;
    cursor.skip_whitespace();

    let mut matcher = None;
    let rest = cursor.remaining();
    if let Some(operator) = ATTRIBUTE_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
        cursor.forward(cursor.index() + operator.len())?;
        cursor.skip_whitespace();
        let value = cursor.until(Token::CloseBracket)?;
        matcher = Some(AttributeMatch {
            operator: operator.to_string(),
            value: value.trim_end().to_string(),
        });
    }

    cursor.expect(Token::CloseBracket)?;
    emit(cursor, sink, position, SelectorPartKind::Attribute { name, matcher })
}

/// `:name`, `:name(args)` or `::name`. Single-colon names found in the
/// grammar's legacy table are pseudo-elements.
pub fn pseudo_selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    let position = cursor.position();
    if !cursor.optionally_present(Token::Colon) {
        return Ok(false);
    }

    if cursor.optionally_present(Token::Colon) {
        let name = cursor
            .read_ident()
            .ok_or_else(|| cursor.error(ErrorCode::ExpectedPseudoName))?;
        return emit(cursor, sink, position, SelectorPartKind::PseudoElement(name));
    }

    let name = cursor
        .read_ident()
        .ok_or_else(|| cursor.error(ErrorCode::ExpectedPseudoName))?;

    if grammar.is_legacy_pseudo_element(&name) {
        return emit(cursor, sink, position, SelectorPartKind::PseudoElement(name));
    }

    let args = if Token::OpenParen.matches(cursor.current()) {
        let args = cursor.chomp_enclosed_value(Token::OpenParen, Token::CloseParen)?;
        Some(args.trim().to_string())
    } else {
        None
    };
    emit(cursor, sink, position, SelectorPartKind::PseudoClass { name, args })
}

/// A combinator between two compound selectors. Whitespace alone is a
/// descendant combinator unless it trails the selector.
///
/// Comments read while looking past the whitespace stay consumed even when
/// no combinator follows them.
pub fn combinator(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    let snapshot = cursor.snapshot();
    let position = cursor.position();

    let whitespace = !cursor.chomp(Token::Whitespace).is_empty();
    let after_whitespace = cursor.index();
    cursor.collect_comments(true)?;
    let read_comments = cursor.index() != after_whitespace;

    let kind = match cursor.optional(Token::AnyOf(">+~")) {
        Some(symbol) => {
            cursor.skip_whitespace();
            CombinatorKind::from_symbol(symbol)
        }
        None if whitespace
            && !cursor.eof()
            && !grammar.selector_end.matches(cursor.current()) =>
        {
            Some(CombinatorKind::Descendant)
        }
        None => None,
    };

    match kind {
        Some(kind) => emit(cursor, sink, position, SelectorPartKind::Combinator(kind)),
        None => {
            if !read_comments {
                cursor.restore(snapshot);
            }
            Ok(false)
        }
    }
}
