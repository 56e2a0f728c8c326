//! Syntax tree units.
//!
//! Every node is held through a [`Shared`] handle so the same node can be
//! attached to its parent and, at the same time, delivered to passes as a
//! [`Syntax`] event. Nodes that may still hold unparsed source
//! ([`Selector`], [`Declaration`], [`AtRule`], [`FunctionValue`]) keep it in
//! a [`RawSpan`] until they are refined.
//!
//! ## Submodules
//!
//! - [`rule`]: stylesheets, statements and rules
//! - [`selector`]: selectors and their parts
//! - [`declaration`]: declarations, property values, terms and functions
//! - [`at_rule`]: at-rules with their expression and block

pub mod at_rule;
pub mod declaration;
pub mod rule;
pub mod selector;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::broadcast::Broadcaster;
use crate::error::{Position, Result};

pub use at_rule::{AtRule, AtRuleBlock, AtRuleExpression, ExpressionKind};
pub use declaration::{
    Declaration, FunctionArgs, FunctionArgsKind, FunctionValue, PropertyName, PropertyValue,
    Term, TermKind, ValueMember,
};
pub use rule::{Rule, Statement, Stylesheet};
pub use selector::{AttributeMatch, CombinatorKind, Selector, SelectorPart, SelectorPartKind};

/// A node handle. Cloning the handle shares the node.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Unparsed source text together with the position of its first character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSpan {
    pub line: usize,
    pub column: usize,
    pub content: String,
}

impl RawSpan {
    pub fn new(position: Position, content: impl Into<String>) -> Self {
        Self {
            line: position.line,
            column: position.column,
            content: content.into(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Broadcast status of a node. Statuses only ever move forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    #[default]
    Unbroadcast,
    Broadcast,
    Processed,
    /// Pass-defined states, ordered after `Processed`.
    Custom(u8),
}

/// Data shared by every node: where it came from, its broadcast status and
/// the comments attached to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    position: Option<Position>,
    status: Status,
    comments: Vec<String>,
    orphaned_comments: Vec<String>,
}

impl Meta {
    pub fn at(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Meta for a node created by a pass rather than read from source.
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Moves the status forward. Returns `false` (and changes nothing) if
    /// `status` is not later than the current one.
    pub fn advance_status(&mut self, status: Status) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comments(&mut self, comments: impl IntoIterator<Item = String>) {
        self.comments.extend(comments);
    }

    /// Comments found at the end of a container, after its last child.
    pub fn orphaned_comments(&self) -> &[String] {
        &self.orphaned_comments
    }

    pub fn add_orphaned_comments(&mut self, comments: impl IntoIterator<Item = String>) {
        self.orphaned_comments.extend(comments);
    }
}

bitflags! {
    /// Event-type tags used for subscription dispatch.
    ///
    /// The low bits name concrete node kinds, the high bits name
    /// categories a kind participates in. Each kind's full set comes from
    /// [`SyntaxKind::tags`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventTags: u64 {
        const RULE = 1 << 0;
        const AT_RULE = 1 << 1;
        const AT_RULE_EXPRESSION = 1 << 2;
        const AT_RULE_BLOCK = 1 << 3;
        const SELECTOR = 1 << 4;
        const TYPE_SELECTOR = 1 << 5;
        const UNIVERSAL_SELECTOR = 1 << 6;
        const ID_SELECTOR = 1 << 7;
        const CLASS_SELECTOR = 1 << 8;
        const ATTRIBUTE_SELECTOR = 1 << 9;
        const PSEUDO_CLASS_SELECTOR = 1 << 10;
        const PSEUDO_ELEMENT_SELECTOR = 1 << 11;
        const COMBINATOR = 1 << 12;
        const DECLARATION = 1 << 13;
        const PROPERTY_VALUE = 1 << 14;
        const KEYWORD_VALUE = 1 << 15;
        const NUMERIC_VALUE = 1 << 16;
        const STRING_VALUE = 1 << 17;
        const HEX_COLOR_VALUE = 1 << 18;
        const OPERATOR = 1 << 19;
        const FUNCTION_VALUE = 1 << 20;
        const FUNCTION_ARGS = 1 << 21;
        const KEYFRAME_SELECTOR = 1 << 22;

        /// Every node.
        const SYNTAX = 1 << 32;
        const STATEMENT = 1 << 33;
        /// Nodes that may hold unparsed source.
        const REFINABLE = 1 << 34;
        const SELECTOR_PART = 1 << 35;
        /// Selector parts other than combinators.
        const SIMPLE_SELECTOR = 1 << 36;
        /// Anything that can sit in a property value.
        const VALUE_MEMBER = 1 << 37;
        const TERM = 1 << 38;
        const AT_RULE_MEMBER = 1 << 39;
    }
}

const fn tagged(kind: EventTags, categories: EventTags) -> EventTags {
    kind.union(EventTags::SYNTAX).union(categories)
}

/// The concrete kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Rule,
    AtRule,
    AtRuleExpression,
    AtRuleBlock,
    Selector,
    TypeSelector,
    UniversalSelector,
    IdSelector,
    ClassSelector,
    AttributeSelector,
    PseudoClassSelector,
    PseudoElementSelector,
    KeyframeSelector,
    Combinator,
    Declaration,
    PropertyValue,
    KeywordValue,
    NumericValue,
    StringValue,
    HexColorValue,
    Operator,
    FunctionValue,
    FunctionArgs,
}

impl SyntaxKind {
    /// The tag set for this kind: its own tag plus every category it
    /// belongs to.
    pub const fn tags(self) -> EventTags {
        use EventTags as T;

        const SIMPLE: EventTags = T::SELECTOR_PART.union(T::SIMPLE_SELECTOR);
        const TERM: EventTags = T::VALUE_MEMBER.union(T::TERM);

        match self {
            SyntaxKind::Rule => tagged(T::RULE, T::STATEMENT),
            SyntaxKind::AtRule => tagged(T::AT_RULE, T::STATEMENT.union(T::REFINABLE)),
            SyntaxKind::AtRuleExpression => tagged(T::AT_RULE_EXPRESSION, T::AT_RULE_MEMBER),
            SyntaxKind::AtRuleBlock => tagged(T::AT_RULE_BLOCK, T::AT_RULE_MEMBER),
            SyntaxKind::Selector => tagged(T::SELECTOR, T::REFINABLE),
            SyntaxKind::TypeSelector => tagged(T::TYPE_SELECTOR, SIMPLE),
            SyntaxKind::UniversalSelector => tagged(T::UNIVERSAL_SELECTOR, SIMPLE),
            SyntaxKind::IdSelector => tagged(T::ID_SELECTOR, SIMPLE),
            SyntaxKind::ClassSelector => tagged(T::CLASS_SELECTOR, SIMPLE),
            SyntaxKind::AttributeSelector => tagged(T::ATTRIBUTE_SELECTOR, SIMPLE),
            SyntaxKind::PseudoClassSelector => tagged(T::PSEUDO_CLASS_SELECTOR, SIMPLE),
            SyntaxKind::PseudoElementSelector => tagged(T::PSEUDO_ELEMENT_SELECTOR, SIMPLE),
            SyntaxKind::KeyframeSelector => tagged(T::KEYFRAME_SELECTOR, SIMPLE),
            SyntaxKind::Combinator => tagged(T::COMBINATOR, T::SELECTOR_PART),
            SyntaxKind::Declaration => tagged(T::DECLARATION, T::REFINABLE),
            SyntaxKind::PropertyValue => tagged(T::PROPERTY_VALUE, T::empty()),
            SyntaxKind::KeywordValue => tagged(T::KEYWORD_VALUE, TERM),
            SyntaxKind::NumericValue => tagged(T::NUMERIC_VALUE, TERM),
            SyntaxKind::StringValue => tagged(T::STRING_VALUE, TERM),
            SyntaxKind::HexColorValue => tagged(T::HEX_COLOR_VALUE, TERM),
            SyntaxKind::Operator => tagged(T::OPERATOR, T::VALUE_MEMBER),
            SyntaxKind::FunctionValue => {
                tagged(T::FUNCTION_VALUE, T::VALUE_MEMBER.union(T::REFINABLE))
            }
            SyntaxKind::FunctionArgs => tagged(T::FUNCTION_ARGS, T::empty()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SyntaxKind::Rule => "rule",
            SyntaxKind::AtRule => "at-rule",
            SyntaxKind::AtRuleExpression => "at-rule expression",
            SyntaxKind::AtRuleBlock => "at-rule block",
            SyntaxKind::Selector => "selector",
            SyntaxKind::TypeSelector => "type selector",
            SyntaxKind::UniversalSelector => "universal selector",
            SyntaxKind::IdSelector => "id selector",
            SyntaxKind::ClassSelector => "class selector",
            SyntaxKind::AttributeSelector => "attribute selector",
            SyntaxKind::PseudoClassSelector => "pseudo class selector",
            SyntaxKind::PseudoElementSelector => "pseudo element selector",
            SyntaxKind::KeyframeSelector => "keyframe selector",
            SyntaxKind::Combinator => "combinator",
            SyntaxKind::Declaration => "declaration",
            SyntaxKind::PropertyValue => "property value",
            SyntaxKind::KeywordValue => "keyword value",
            SyntaxKind::NumericValue => "numeric value",
            SyntaxKind::StringValue => "string value",
            SyntaxKind::HexColorValue => "hex color value",
            SyntaxKind::Operator => "operator",
            SyntaxKind::FunctionValue => "function value",
            SyntaxKind::FunctionArgs => "function arguments",
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Implemented by every node type.
pub trait SyntaxUnit: fmt::Debug + Sized + 'static {
    fn meta(&self) -> &Meta;

    fn meta_mut(&mut self) -> &mut Meta;

    fn kind(&self) -> SyntaxKind;

    fn wrap(handle: Shared<Self>) -> Syntax;

    /// Extracts a handle of this type from an event, if the event holds
    /// one.
    fn unwrap(syntax: &Syntax) -> Option<Shared<Self>>;
}

macro_rules! syntax_unit {
    ($ty:ident, $variant:ident, |$this:ident| $kind:expr) => {
        impl $crate::ast::SyntaxUnit for $ty {
            fn meta(&self) -> &$crate::ast::Meta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::ast::Meta {
                &mut self.meta
            }

            fn kind(&self) -> $crate::ast::SyntaxKind {
                let $this = self;
                $kind
            }

            fn wrap(handle: $crate::ast::Shared<Self>) -> $crate::ast::Syntax {
                $crate::ast::Syntax::$variant(handle)
            }

            fn unwrap(syntax: &$crate::ast::Syntax) -> Option<$crate::ast::Shared<Self>> {
                match syntax {
                    $crate::ast::Syntax::$variant(handle) => Some(std::rc::Rc::clone(handle)),
                    _ => None,
                }
            }
        }

        impl From<$crate::ast::Shared<$ty>> for $crate::ast::Syntax {
            fn from(handle: $crate::ast::Shared<$ty>) -> Self {
                $crate::ast::Syntax::$variant(handle)
            }
        }
    };
}

pub(crate) use syntax_unit;

/// A node delivered through the broadcast chain.
#[derive(Clone, Debug)]
pub enum Syntax {
    Rule(Shared<Rule>),
    AtRule(Shared<AtRule>),
    AtRuleExpression(Shared<AtRuleExpression>),
    AtRuleBlock(Shared<AtRuleBlock>),
    Selector(Shared<Selector>),
    SelectorPart(Shared<SelectorPart>),
    Declaration(Shared<Declaration>),
    PropertyValue(Shared<PropertyValue>),
    Term(Shared<Term>),
    FunctionValue(Shared<FunctionValue>),
    FunctionArgs(Shared<FunctionArgs>),
}

macro_rules! each_syntax {
    ($syntax:expr, $node:ident => $body:expr) => {
        match $syntax {
            Syntax::Rule($node) => $body,
            Syntax::AtRule($node) => $body,
            Syntax::AtRuleExpression($node) => $body,
            Syntax::AtRuleBlock($node) => $body,
            Syntax::Selector($node) => $body,
            Syntax::SelectorPart($node) => $body,
            Syntax::Declaration($node) => $body,
            Syntax::PropertyValue($node) => $body,
            Syntax::Term($node) => $body,
            Syntax::FunctionValue($node) => $body,
            Syntax::FunctionArgs($node) => $body,
        }
    };
}

impl Syntax {
    pub fn kind(&self) -> SyntaxKind {
        each_syntax!(self, node => node.borrow().kind())
    }

    pub fn tags(&self) -> EventTags {
        self.kind().tags()
    }

    pub fn position(&self) -> Option<Position> {
        each_syntax!(self, node => node.borrow().meta().position())
    }

    pub fn status(&self) -> Status {
        each_syntax!(self, node => node.borrow().meta().status())
    }

    /// Moves the node's status forward; see [`Meta::advance_status`].
    pub fn advance_status(&self, status: Status) -> bool {
        each_syntax!(self, node => node.borrow_mut().meta_mut().advance_status(status))
    }

    /// Extracts a typed handle; see [`SyntaxUnit::unwrap`].
    pub fn get<T: SyntaxUnit>(&self) -> Option<Shared<T>> {
        T::unwrap(self)
    }

    /// Whether both events hold the very same node.
    pub fn ptr_eq(&self, other: &Syntax) -> bool {
        self.address() == other.address()
    }

    fn address(&self) -> *const () {
        each_syntax!(self, node => Rc::as_ptr(node) as *const ())
    }

    /// The node's direct children, in tree order.
    pub fn children(&self) -> Vec<Syntax> {
        match self {
            Syntax::Rule(rule) => {
                let rule = rule.borrow();
                let selectors = rule.selectors.iter().cloned().map(Syntax::from);
                let declarations = rule.declarations.iter().cloned().map(Syntax::from);
                selectors.chain(declarations).collect()
            }
            Syntax::AtRule(at_rule) => {
                let at_rule = at_rule.borrow();
                let expression = at_rule.expression.clone().map(Syntax::from);
                let block = at_rule.block.clone().map(Syntax::from);
                expression.into_iter().chain(block).collect()
            }
            Syntax::AtRuleBlock(block) => {
                let block = block.borrow();
                let statements = block.statements.iter().map(Statement::to_syntax);
                let declarations = block.declarations.iter().cloned().map(Syntax::from);
                statements.chain(declarations).collect()
            }
            Syntax::Selector(selector) => selector
                .borrow()
                .parts()
                .iter()
                .cloned()
                .map(Syntax::from)
                .collect(),
            Syntax::Declaration(declaration) => declaration
                .borrow()
                .value
                .clone()
                .map(Syntax::from)
                .into_iter()
                .collect(),
            Syntax::PropertyValue(value) => value
                .borrow()
                .members
                .iter()
                .map(ValueMember::to_syntax)
                .collect(),
            Syntax::FunctionValue(function) => function
                .borrow()
                .args
                .clone()
                .map(Syntax::from)
                .into_iter()
                .collect(),
            Syntax::FunctionArgs(args) => match &args.borrow().kind {
                FunctionArgsKind::Terms(members) => {
                    members.iter().map(ValueMember::to_syntax).collect()
                }
                FunctionArgsKind::Url(_) => Vec::new(),
            },
            Syntax::AtRuleExpression(_) | Syntax::SelectorPart(_) | Syntax::Term(_) => Vec::new(),
        }
    }

    /// Broadcasts this node and its descendants through `sink`, children
    /// first. Nodes that have already been broadcast are skipped.
    pub fn propagate(&self, sink: &mut dyn Broadcaster) -> Result<()> {
        for child in self.children() {
            child.propagate(sink)?;
        }
        if self.status() == Status::Unbroadcast {
            sink.broadcast(self.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward() {
        let mut meta = Meta::synthetic();
        assert!(meta.advance_status(Status::Broadcast));
        assert!(meta.advance_status(Status::Custom(3)));
        assert!(!meta.advance_status(Status::Processed));
        assert_eq!(meta.status(), Status::Custom(3));
    }

    #[test]
    fn kind_tags_contain_own_tag_and_categories() {
        let tags = SyntaxKind::ClassSelector.tags();
        assert!(tags.contains(EventTags::CLASS_SELECTOR));
        assert!(tags.contains(EventTags::SELECTOR_PART | EventTags::SIMPLE_SELECTOR));
        assert!(tags.contains(EventTags::SYNTAX));
        assert!(!tags.intersects(EventTags::COMBINATOR | EventTags::TERM));
    }

    #[test]
    fn combinator_is_not_a_simple_selector() {
        let tags = SyntaxKind::Combinator.tags();
        assert!(tags.contains(EventTags::SELECTOR_PART));
        assert!(!tags.contains(EventTags::SIMPLE_SELECTOR));
    }

    #[test]
    fn synthetic_meta_has_no_position() {
        assert_eq!(Meta::synthetic().position(), None);
        assert_eq!(
            Meta::at(Position::new(2, 5)).position(),
            Some(Position::new(2, 5))
        );
    }
}
