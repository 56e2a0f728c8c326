//! Parser units.
//!
//! A unit is a plain function over a [`Cursor`], a broadcast sink and the
//! [`Grammar`]. It returns `Ok(false)` when the construct is not present,
//! leaving the cursor where it found it, and `Ok(true)` after broadcasting
//! the nodes it built. Once a unit has consumed a delimiter that commits it
//! to the construct, any further mismatch is a [`CssError`].
//!
//! The raw layer ([`raw`]) reads statements quickly, keeping selectors,
//! declaration values and at-rule bodies as [`RawSpan`]s. The [`selector`]
//! and [`value`] units run later, over those spans, when a node is refined.
//!
//! [`CssError`]: crate::error::CssError
//! [`RawSpan`]: crate::ast::RawSpan

pub mod raw;
pub mod selector;
pub mod value;

use crate::ast::{Declaration, Shared, Statement, Stylesheet};
use crate::broadcast::{Broadcaster, QueryableBroadcaster};
use crate::cursor::Cursor;
use crate::error::{ErrorCode, Result};
use crate::grammar::Grammar;

/// Parses a whole document. Every statement must match; anything left
/// over is an error.
pub fn stylesheet(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<Stylesheet> {
    let statements = statements(cursor, sink, grammar)?;
    let orphaned_comments = cursor.flush_comments();

    if !cursor.eof() {
        return Err(cursor.error(ErrorCode::UnparsableContent(cursor.remaining())));
    }

    Ok(Stylesheet {
        statements,
        orphaned_comments,
    })
}

/// Reads statements until neither an at-rule nor a rule matches. The
/// cursor is left after the last statement's trailing whitespace and
/// comments, which stay buffered on the cursor.
pub fn statements(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();

    loop {
        cursor.skip_whitespace();
        cursor.collect_comments(true)?;
        if cursor.eof() {
            break;
        }

        let mut query = QueryableBroadcaster::new(sink);
        let matched =
            raw::at_rule(cursor, &mut query, grammar)? || raw::rule(cursor, &mut query, grammar)?;
        if !matched {
            break;
        }

        // the statement itself is broadcast after its children
        if let Some(statement) = query
            .received()
            .iter()
            .rev()
            .find_map(Statement::from_syntax)
        {
            statements.push(statement);
        }
    }

    Ok(statements)
}

/// Reads delimited declarations until the delimiter stops appearing. The
/// cursor is left after any trailing whitespace and comments, which stay
/// buffered on the cursor.
pub fn declarations(
    cursor: &mut Cursor,
    sink: &mut dyn Broadcaster,
    grammar: &Grammar,
) -> Result<Vec<Shared<Declaration>>> {
    let mut query = QueryableBroadcaster::new(sink);

    loop {
        raw::declaration(cursor, &mut query, grammar)?;
        if !cursor.optionally_present(grammar.declaration_delimiter) {
            break;
        }
    }

    cursor.skip_whitespace();
    cursor.collect_comments(true)?;
    Ok(query.filter::<Declaration>())
}
