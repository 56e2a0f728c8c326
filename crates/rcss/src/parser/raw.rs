//! The raw statement layer.
//!
//! These units split a document into rules and at-rules without looking
//! inside selectors, declaration values or at-rule bodies. Each of those is
//! captured as a [`RawSpan`] positioned at its first non-whitespace
//! character, so refining it later reports positions in the original
//! source.

use crate::ast::{
    AtRule, Declaration, PropertyName, RawSpan, Rule, Selector, Syntax, shared,
};
use crate::broadcast::{Broadcaster, QueryableBroadcaster, QueuingBroadcaster};
use crate::cursor::Cursor;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::grammar::Grammar;
use crate::tokens::Token;

/// A rule: a selector group followed by a declaration block.
///
/// Selectors and declarations are held back until the rule is complete, so
/// by the time anything downstream sees them they are already part of the
/// rule.
pub fn rule(cursor: &mut Cursor, sink: &mut dyn Broadcaster, grammar: &Grammar) -> Result<bool> {
    cursor.skip_whitespace();
    cursor.collect_comments(true)?;

    let snapshot = cursor.snapshot();
    let rule = shared(Rule::new(cursor.position()));

    let mut queue = QueuingBroadcaster::new(sink);
    queue.pause();
    let mut query = QueryableBroadcaster::new(&mut queue);

    if !selector(cursor, &mut query, grammar)? {
        cursor.restore(snapshot);
        return Ok(false);
    }
    while cursor.optionally_present(grammar.selector_delimiter) {
        if !selector(cursor, &mut query, grammar)? {
            return Err(cursor.error(ErrorCode::ExpectedSelector));
        }
    }

    cursor.expect(grammar.block_begin)?;
    let declarations = super::declarations(cursor, &mut query, grammar)?;
    if !cursor.eof() && !grammar.block_end.matches(cursor.current()) {
        return Err(cursor.error(ErrorCode::ExpectedDeclaration));
    }
    cursor.expect(grammar.block_end)?;

    {
        let mut rule = rule.borrow_mut();
        rule.selectors = query.filter::<Selector>();
        rule.declarations = declarations;
        rule.meta.add_orphaned_comments(cursor.flush_comments());
    }
    drop(query);

    queue.resume()?;
    queue.broadcast(Syntax::from(rule))?;
    Ok(true)
}

/// One selector of a selector group, kept raw.
pub fn selector(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    cursor.skip_whitespace();
    cursor.collect_comments(true)?;

    let current = cursor.current();
    if current.is_none()
        || grammar.selector_end.matches(current)
        || grammar.block_begin.matches(current)
        || grammar.block_end.matches(current)
    {
        return Ok(false);
    }

    let snapshot = cursor.snapshot();
    let content = cursor.until(grammar.selector_end)?;
    let content = content.trim_end();
    if content.is_empty() {
        cursor.restore(snapshot);
        return Ok(false);
    }

    let mut selector = Selector::raw(RawSpan::new(snapshot.position(), content));
    selector.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(selector)))?;
    Ok(true)
}

/// A `name: value` declaration with the value kept raw.
pub fn declaration(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    cursor.skip_whitespace();
    cursor.collect_comments(true)?;

    let snapshot = cursor.snapshot();
    let Some(name) = cursor.read_ident() else {
        return Ok(false);
    };

    cursor.skip_whitespace();
    if !cursor.optionally_present(grammar.property_name_end) {
        cursor.restore(snapshot);
        return Ok(false);
    }

    cursor.skip_whitespace();
    let value_position = cursor.position();
    let value = cursor.until(grammar.declaration_end)?;
    let value = value.trim_end();
    if value.is_empty() {
        return Err(CssError::new(
            ErrorCode::MissingDeclarationValue(name),
            value_position,
        ));
    }

    let mut declaration = Declaration::raw(
        snapshot.position(),
        PropertyName::new(name),
        RawSpan::new(value_position, value),
    );
    declaration.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(declaration)))?;
    Ok(true)
}

/// An at-rule, with its expression and block kept raw.
///
/// An at-rule needs an expression, a block, or both: `@import "a.css";`,
/// `@font-face { ... }` and `@media print { ... }` are all accepted, a bare
/// `@name;` is not.
pub fn at_rule(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<bool> {
    cursor.skip_whitespace();
    cursor.collect_comments(true)?;

    let position = cursor.position();
    if !cursor.optionally_present(Token::At) {
        return Ok(false);
    }

    let name = cursor
        .read_ident()
        .ok_or_else(|| cursor.error(ErrorCode::MissingAtRuleName))?;

    cursor.skip_whitespace();
    let expression_position = cursor.position();
    let content = cursor.until(grammar.at_rule_expression_end)?;
    let content = content.trim_end();
    let expression =
        (!content.is_empty()).then(|| RawSpan::new(expression_position, content));

    let mut block = None;
    if !cursor.optionally_present(grammar.at_rule_termination)
        && grammar.block_begin.matches(cursor.current())
    {
        let open = cursor.position();
        let content = cursor.chomp_enclosed_value(grammar.block_begin, grammar.block_end)?;
        block = Some(RawSpan::new(Position::new(open.line, open.column + 1), content));
    }

    if expression.is_none() && block.is_none() {
        return Err(CssError::new(ErrorCode::MissingAtRuleValue(name), position));
    }

    let mut at_rule = AtRule::raw(position, name, expression, block);
    at_rule.meta.add_comments(cursor.flush_comments());
    sink.broadcast(Syntax::from(shared(at_rule)))?;
    Ok(true)
}
