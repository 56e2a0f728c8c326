use std::fmt;

use crate::ast::{Declaration, Meta, RawSpan, Shared, Statement, SyntaxKind, syntax_unit};
use crate::error::Position;

/// An at-rule such as `@media print { ... }` or `@import "a.css";`.
///
/// The expression and block are read raw. Refinement may fill them in
/// independently, so an at-rule counts as refined only once every raw part
/// it has is covered.
#[derive(Debug, Default)]
pub struct AtRule {
    pub meta: Meta,
    pub name: String,
    pub raw_expression: Option<RawSpan>,
    pub raw_block: Option<RawSpan>,
    pub expression: Option<Shared<AtRuleExpression>>,
    pub block: Option<Shared<AtRuleBlock>>,
    refined: bool,
}

impl AtRule {
    pub fn raw(
        position: Position,
        name: impl Into<String>,
        raw_expression: Option<RawSpan>,
        raw_block: Option<RawSpan>,
    ) -> Self {
        Self {
            meta: Meta::at(position),
            name: name.into(),
            raw_expression,
            raw_block,
            ..Self::default()
        }
    }

    /// A synthetic at-rule; it has nothing raw, so it is already refined.
    pub fn synthetic(
        name: impl Into<String>,
        expression: Option<Shared<AtRuleExpression>>,
        block: Option<Shared<AtRuleBlock>>,
    ) -> Self {
        Self {
            meta: Meta::synthetic(),
            name: name.into(),
            expression,
            block,
            refined: true,
            ..Self::default()
        }
    }

    pub fn is_refined(&self) -> bool {
        self.refined
    }

    pub(crate) fn mark_refined(&mut self) {
        self.refined = true;
    }

    /// Whether a raw expression is still waiting for a structured one.
    pub fn needs_expression(&self) -> bool {
        self.raw_expression.is_some() && self.expression.is_none()
    }

    /// Whether a raw block is still waiting for a structured one.
    pub fn needs_block(&self) -> bool {
        self.raw_block.is_some() && self.block.is_none()
    }

    pub fn is_covered(&self) -> bool {
        !self.needs_expression() && !self.needs_block()
    }
}

syntax_unit!(AtRule, AtRule, |_at_rule| SyntaxKind::AtRule);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpressionKind {
    /// The expression text, whitespace-normalized.
    Raw(String),
    MediaQueryList(Vec<String>),
}

#[derive(Debug)]
pub struct AtRuleExpression {
    pub meta: Meta,
    pub kind: ExpressionKind,
}

impl AtRuleExpression {
    pub fn new(position: Position, kind: ExpressionKind) -> Self {
        Self {
            meta: Meta::at(position),
            kind,
        }
    }

    pub fn synthetic(kind: ExpressionKind) -> Self {
        Self {
            meta: Meta::synthetic(),
            kind,
        }
    }
}

impl fmt::Display for AtRuleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Raw(text) => f.write_str(text),
            ExpressionKind::MediaQueryList(queries) => f.write_str(&queries.join(", ")),
        }
    }
}

syntax_unit!(AtRuleExpression, AtRuleExpression, |_expression| {
    SyntaxKind::AtRuleExpression
});

/// The body of an at-rule. Blocks such as `@media` hold statements;
/// blocks such as `@font-face` hold declarations.
#[derive(Debug, Default)]
pub struct AtRuleBlock {
    pub meta: Meta,
    pub statements: Vec<Statement>,
    pub declarations: Vec<Shared<Declaration>>,
}

impl AtRuleBlock {
    pub fn new(position: Position) -> Self {
        Self {
            meta: Meta::at(position),
            ..Self::default()
        }
    }

    pub fn synthetic() -> Self {
        Self::default()
    }
}

syntax_unit!(AtRuleBlock, AtRuleBlock, |_block| SyntaxKind::AtRuleBlock);
