//! The fallback strategy: nested parses with the ordinary parser units.

use crate::ast::{
    AtRule, AtRuleBlock, AtRuleExpression, Declaration, ExpressionKind, FunctionArgs,
    FunctionArgsKind, FunctionValue, RawSpan, Selector, Shared, Syntax, shared,
};
use crate::broadcast::Broadcaster;
use crate::cursor::Cursor;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::parser;
use crate::refine::{
    AtRuleStrategy, DeclarationStrategy, FunctionStrategy, Refinement, Refiner, SelectorStrategy,
};

/// Always applies, and always returns [`Refinement::Full`] or an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardStrategy;

impl AtRuleStrategy for StandardStrategy {
    fn refine(
        &self,
        at_rule: &Shared<AtRule>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement> {
        let (name, position, expression, block) = {
            let at_rule = at_rule.borrow();
            let expression = at_rule
                .needs_expression()
                .then(|| at_rule.raw_expression.clone())
                .flatten();
            let block = at_rule.needs_block().then(|| at_rule.raw_block.clone()).flatten();
            let has_raw = at_rule.raw_expression.is_some() || at_rule.raw_block.is_some();
            if !has_raw && at_rule.expression.is_none() && at_rule.block.is_none() {
                return Err(CssError::new(
                    ErrorCode::MissingAtRuleValue(at_rule.name.clone()),
                    at_rule.meta.position().unwrap_or(Position::UNKNOWN),
                ));
            }
            (
                at_rule.name.clone(),
                at_rule.meta.position(),
                expression,
                block,
            )
        };
        log::trace!("standard refinement of @{name} at {position:?}");

        if let Some(raw) = expression {
            let text = raw.content.split_whitespace().collect::<Vec<_>>().join(" ");
            let expression = AtRuleExpression::new(raw.position(), ExpressionKind::Raw(text));
            sink.broadcast(Syntax::from(shared(expression)))?;
        }

        if let Some(raw) = block {
            let grammar = refiner.grammar();
            let mut cursor = Cursor::from_raw(&raw);
            let mut block = AtRuleBlock::new(raw.position());
            if grammar.has_declaration_block(&name) {
                block.declarations = parser::declarations(&mut cursor, sink, grammar)?;
            } else {
                block.statements = parser::statements(&mut cursor, sink, grammar)?;
            }
            if !cursor.eof() {
                return Err(cursor.error(ErrorCode::UnparsableContent(cursor.remaining())));
            }
            block.meta.add_orphaned_comments(cursor.flush_comments());
            sink.broadcast(Syntax::from(shared(block)))?;
        }

        Ok(Refinement::Full)
    }
}

impl SelectorStrategy for StandardStrategy {
    fn refine(
        &self,
        selector: &Shared<Selector>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement> {
        let raw = selector.borrow().raw.clone();
        let Some(raw) = raw else {
            let position = selector.borrow().meta.position().unwrap_or(Position::UNKNOWN);
            return Err(CssError::new(ErrorCode::ExpectedSelector, position));
        };

        let mut cursor = Cursor::from_raw(&raw);
        let matched = parser::selector::complex_selector(&mut cursor, sink, refiner.grammar())?;
        cursor.skip_whitespace();
        cursor.collect_comments(true)?;
        if !matched || !cursor.eof() {
            return Err(cursor.error(ErrorCode::UnparsableSelector(cursor.remaining())));
        }

        selector
            .borrow_mut()
            .meta
            .add_orphaned_comments(cursor.flush_comments());
        Ok(Refinement::Full)
    }
}

impl DeclarationStrategy for StandardStrategy {
    fn refine(
        &self,
        declaration: &Shared<Declaration>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement> {
        let (raw, property, position) = {
            let declaration = declaration.borrow();
            (
                declaration.raw_value.clone(),
                declaration.property.to_string(),
                declaration.meta.position().unwrap_or(Position::UNKNOWN),
            )
        };
        let Some(raw) = raw else {
            return Err(CssError::new(
                ErrorCode::MissingDeclarationValue(property),
                position,
            ));
        };

        let mut cursor = Cursor::from_raw(&raw);
        let matched = parser::value::property_value(&mut cursor, sink, refiner.grammar())?;
        cursor.skip_whitespace();
        cursor.collect_comments(true)?;
        if !matched || !cursor.eof() {
            return Err(cursor.error(ErrorCode::UnparsableDeclarationValue(cursor.remaining())));
        }

        declaration
            .borrow_mut()
            .meta
            .add_orphaned_comments(cursor.flush_comments());
        Ok(Refinement::Full)
    }
}

impl FunctionStrategy for StandardStrategy {
    fn refine(
        &self,
        function: &Shared<FunctionValue>,
        sink: &mut dyn Broadcaster,
        refiner: &Refiner,
    ) -> Result<Refinement> {
        let (name, raw) = {
            let function = function.borrow();
            let position = function.meta.position().unwrap_or(Position::UNKNOWN);
            let raw = function
                .raw_args
                .clone()
                .unwrap_or_else(|| RawSpan::new(position, String::new()));
            (function.name.clone(), raw)
        };

        let args = if name.eq_ignore_ascii_case("url") {
            FunctionArgs::new(raw.position(), FunctionArgsKind::Url(unquote(raw.content.trim())))
        } else {
            let mut cursor = Cursor::from_raw(&raw);
            let members = parser::value::members(&mut cursor, sink, refiner.grammar())?;
            cursor.skip_whitespace();
            cursor.collect_comments(true)?;
            if !cursor.eof() {
                return Err(
                    cursor.error(ErrorCode::UnparsableDeclarationValue(cursor.remaining()))
                );
            }
            let mut args = FunctionArgs::new(raw.position(), FunctionArgsKind::Terms(members));
            args.meta.add_orphaned_comments(cursor.flush_comments());
            args
        };

        sink.broadcast(Syntax::from(shared(args)))?;
        Ok(Refinement::Full)
    }
}

fn unquote(text: &str) -> String {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}
