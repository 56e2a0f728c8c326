use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::{Meta, RawSpan, Shared, SyntaxKind, syntax_unit};
use crate::error::Position;

/// One complex selector of a rule's selector group, e.g. `ul > li.active`.
///
/// Selectors are read raw and refined into [`SelectorPart`]s on demand.
#[derive(Debug, Default)]
pub struct Selector {
    pub meta: Meta,
    pub raw: Option<RawSpan>,
    refined: bool,
    parts: Vec<Shared<SelectorPart>>,
}

impl Selector {
    /// An unrefined selector over `raw`, positioned at its first character.
    pub fn raw(raw: RawSpan) -> Self {
        Self {
            meta: Meta::at(raw.position()),
            raw: Some(raw),
            ..Self::default()
        }
    }

    /// A synthetic, already-refined selector built from `parts`.
    pub fn create(parts: Vec<SelectorPart>) -> Shared<Selector> {
        let selector = Rc::new(RefCell::new(Self {
            refined: true,
            ..Self::default()
        }));
        for part in parts {
            Self::append(&selector, Rc::new(RefCell::new(part)));
        }
        selector
    }

    pub fn is_refined(&self) -> bool {
        self.refined
    }

    pub(crate) fn mark_refined(&mut self) {
        self.refined = true;
    }

    pub fn parts(&self) -> &[Shared<SelectorPart>] {
        &self.parts
    }

    /// Appends `part`, linking it back to `selector`.
    pub fn append(selector: &Shared<Selector>, part: Shared<SelectorPart>) {
        part.borrow_mut().parent = Rc::downgrade(selector);
        selector.borrow_mut().parts.push(part);
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.refined {
            if let Some(raw) = &self.raw {
                return f.write_str(&raw.content);
            }
        }
        for part in &self.parts {
            write!(f, "{}", part.borrow().kind)?;
        }
        Ok(())
    }
}

syntax_unit!(Selector, Selector, |_selector| SyntaxKind::Selector);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

impl CombinatorKind {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '>' => Some(CombinatorKind::Child),
            '+' => Some(CombinatorKind::AdjacentSibling),
            '~' => Some(CombinatorKind::GeneralSibling),
            _ => None,
        }
    }
}

impl fmt::Display for CombinatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CombinatorKind::Descendant => " ",
            CombinatorKind::Child => " > ",
            CombinatorKind::AdjacentSibling => " + ",
            CombinatorKind::GeneralSibling => " ~ ",
        };
        f.write_str(symbol)
    }
}

/// The operator and value of an attribute selector such as `[lang|="en"]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMatch {
    pub operator: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorPartKind {
    Type(String),
    Universal,
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<AttributeMatch>,
    },
    PseudoClass {
        name: String,
        args: Option<String>,
    },
    PseudoElement(String),
    /// A keyframe offset, without its `%` sign.
    KeyframeOffset(String),
    Combinator(CombinatorKind),
}

impl SelectorPartKind {
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self {
            SelectorPartKind::Type(_) => SyntaxKind::TypeSelector,
            SelectorPartKind::Universal => SyntaxKind::UniversalSelector,
            SelectorPartKind::Id(_) => SyntaxKind::IdSelector,
            SelectorPartKind::Class(_) => SyntaxKind::ClassSelector,
            SelectorPartKind::Attribute { .. } => SyntaxKind::AttributeSelector,
            SelectorPartKind::PseudoClass { .. } => SyntaxKind::PseudoClassSelector,
            SelectorPartKind::PseudoElement(_) => SyntaxKind::PseudoElementSelector,
            SelectorPartKind::KeyframeOffset(_) => SyntaxKind::KeyframeSelector,
            SelectorPartKind::Combinator(_) => SyntaxKind::Combinator,
        }
    }
}

impl fmt::Display for SelectorPartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorPartKind::Type(name) => f.write_str(name),
            SelectorPartKind::Universal => f.write_str("*"),
            SelectorPartKind::Id(name) => write!(f, "#{name}"),
            SelectorPartKind::Class(name) => write!(f, ".{name}"),
            SelectorPartKind::Attribute { name, matcher } => match matcher {
                Some(matcher) => write!(f, "[{name}{}{}]", matcher.operator, matcher.value),
                None => write!(f, "[{name}]"),
            },
            SelectorPartKind::PseudoClass { name, args } => match args {
                Some(args) => write!(f, ":{name}({args})"),
                None => write!(f, ":{name}"),
            },
            SelectorPartKind::PseudoElement(name) => write!(f, "::{name}"),
            SelectorPartKind::KeyframeOffset(offset) => write!(f, "{offset}%"),
            SelectorPartKind::Combinator(kind) => write!(f, "{kind}"),
        }
    }
}

/// A simple selector or combinator inside a [`Selector`].
#[derive(Debug)]
pub struct SelectorPart {
    pub meta: Meta,
    pub kind: SelectorPartKind,
    parent: Weak<RefCell<Selector>>,
}

impl SelectorPart {
    pub fn new(position: Position, kind: SelectorPartKind) -> Self {
        Self {
            meta: Meta::at(position),
            kind,
            parent: Weak::new(),
        }
    }

    pub fn synthetic(kind: SelectorPartKind) -> Self {
        Self {
            meta: Meta::synthetic(),
            kind,
            parent: Weak::new(),
        }
    }

    /// The owning selector, once the part has been appended to one.
    pub fn parent(&self) -> Option<Shared<Selector>> {
        self.parent.upgrade()
    }

    /// Whether `part` is the first part of its selector.
    pub fn is_first(part: &Shared<SelectorPart>) -> bool {
        Self::index_in_parent(part) == Some(0)
    }

    /// Whether `part` is the last part of its selector.
    pub fn is_last(part: &Shared<SelectorPart>) -> bool {
        let Some(parent) = part.borrow().parent() else {
            return false;
        };
        let parent = parent.borrow();
        parent
            .parts
            .last()
            .is_some_and(|last| Rc::ptr_eq(last, part))
    }

    fn index_in_parent(part: &Shared<SelectorPart>) -> Option<usize> {
        let parent = part.borrow().parent()?;
        let parent = parent.borrow();
        parent.parts.iter().position(|p| Rc::ptr_eq(p, part))
    }
}

syntax_unit!(SelectorPart, SelectorPart, |part| part.kind.syntax_kind());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_selector_links_parts() {
        let selector = Selector::create(vec![
            SelectorPart::synthetic(SelectorPartKind::Type("ul".into())),
            SelectorPart::synthetic(SelectorPartKind::Combinator(CombinatorKind::Child)),
            SelectorPart::synthetic(SelectorPartKind::Class("item".into())),
        ]);

        let parts = selector.borrow().parts().to_vec();
        assert!(SelectorPart::is_first(&parts[0]));
        assert!(!SelectorPart::is_first(&parts[1]));
        assert!(SelectorPart::is_last(&parts[2]));
        assert_eq!(selector.borrow().to_string(), "ul > .item");
    }

    #[test]
    fn orphan_part_is_neither_first_nor_last() {
        let part = Rc::new(RefCell::new(SelectorPart::synthetic(SelectorPartKind::Universal)));
        assert!(!SelectorPart::is_first(&part));
        assert!(!SelectorPart::is_last(&part));
    }

    #[test]
    fn unrefined_selector_displays_raw_text() {
        let selector = Selector::raw(RawSpan::new(Position::new(1, 1), "a   b"));
        assert_eq!(selector.to_string(), "a   b");
        assert!(!selector.is_refined());
    }
}
