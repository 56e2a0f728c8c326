use crate::ast::{AtRule, Declaration, Meta, Selector, Shared, Syntax, SyntaxKind, syntax_unit};
use crate::error::Position;

/// A parsed document: its top-level statements plus any comments left
/// after the last one.
#[derive(Clone, Debug, Default)]
pub struct Stylesheet {
    pub statements: Vec<Statement>,
    pub orphaned_comments: Vec<String>,
}

impl Stylesheet {
    pub fn rules(&self) -> impl Iterator<Item = &Shared<Rule>> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Rule(rule) => Some(rule),
            Statement::AtRule(_) => None,
        })
    }

    pub fn at_rules(&self) -> impl Iterator<Item = &Shared<AtRule>> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::AtRule(at_rule) => Some(at_rule),
            Statement::Rule(_) => None,
        })
    }
}

/// A top-level or block-level statement.
#[derive(Clone, Debug)]
pub enum Statement {
    Rule(Shared<Rule>),
    AtRule(Shared<AtRule>),
}

impl Statement {
    pub fn to_syntax(&self) -> Syntax {
        match self {
            Statement::Rule(rule) => Syntax::from(rule.clone()),
            Statement::AtRule(at_rule) => Syntax::from(at_rule.clone()),
        }
    }

    /// The statement held by an event, if the event is one.
    pub fn from_syntax(syntax: &Syntax) -> Option<Statement> {
        match syntax {
            Syntax::Rule(rule) => Some(Statement::Rule(rule.clone())),
            Syntax::AtRule(at_rule) => Some(Statement::AtRule(at_rule.clone())),
            _ => None,
        }
    }
}

/// A qualified rule: a selector group and a declaration block.
#[derive(Clone, Debug, Default)]
pub struct Rule {
    pub meta: Meta,
    pub selectors: Vec<Shared<Selector>>,
    pub declarations: Vec<Shared<Declaration>>,
}

impl Rule {
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

syntax_unit!(Rule, Rule, |_rule| SyntaxKind::Rule);
