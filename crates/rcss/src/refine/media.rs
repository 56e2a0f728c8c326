use crate::ast::{AtRule, AtRuleExpression, ExpressionKind, Shared, Syntax, shared};
use crate::broadcast::Broadcaster;
use crate::cursor::Cursor;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::refine::{AtRuleStrategy, Refinement, Refiner};
use crate::tokens::Token;

/// Refines `@media` expressions into a media query list.
///
/// Only the expression is handled; the block is left to later strategies
/// or the standard fallback, so this strategy returns
/// [`Refinement::Partial`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MediaStrategy;

fn is_query_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '(' | ')' | ':' | '-' | '_' | '.' | '/' | '%')
}

impl AtRuleStrategy for MediaStrategy {
    fn refine(
        &self,
        at_rule: &Shared<AtRule>,
        sink: &mut dyn Broadcaster,
        _refiner: &Refiner,
    ) -> Result<Refinement> {
        let raw = {
            let at_rule = at_rule.borrow();
            if !at_rule.name.eq_ignore_ascii_case("media") {
                return Ok(Refinement::None);
            }
            if at_rule.expression.is_some() {
                return Ok(Refinement::None);
            }
            match &at_rule.raw_expression {
                Some(raw) => raw.clone(),
                None => {
                    let position = at_rule.meta.position().unwrap_or(Position::UNKNOWN);
                    return Err(CssError::new(ErrorCode::MissingMediaQuery, position));
                }
            }
        };

        let mut cursor = Cursor::from_raw(&raw);
        let mut queries = Vec::new();
        loop {
            cursor.skip_whitespace();
            let mut query = String::new();
            while let Some(c) = cursor.current() {
                if Token::Comma.matches(Some(c)) {
                    break;
                }
                if !is_query_char(c) {
                    return Err(cursor.error(ErrorCode::UnparsableContent(cursor.remaining())));
                }
                query.push(c);
                cursor.next();
            }

            let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
            if query.is_empty() {
                return Err(cursor.error(ErrorCode::MissingMediaQuery));
            }
            queries.push(query);

            if !cursor.optionally_present(Token::Comma) {
                break;
            }
        }

        let expression =
            AtRuleExpression::new(raw.position(), ExpressionKind::MediaQueryList(queries));
        sink.broadcast(Syntax::from(shared(expression)))?;
        Ok(Refinement::Partial)
    }
}
