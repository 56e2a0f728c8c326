use std::fmt;

use crate::ast::{Meta, RawSpan, Shared, Syntax, SyntaxKind, syntax_unit};
use crate::error::Position;

/// A property name, split into its vendor prefix when it has one.
///
/// ```rust
/// use rcss::ast::PropertyName;
///
/// let name = PropertyName::new("-webkit-border-radius");
/// assert_eq!(name.prefix(), Some("webkit"));
/// assert_eq!(name.unprefixed(), "border-radius");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyName {
    name: String,
    prefix: Option<String>,
}

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = vendor_prefix(&name).map(str::to_string);
        Self { name, prefix }
    }

    /// The name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_prefixed(&self) -> bool {
        self.prefix.is_some()
    }

    /// The name without its `-prefix-` part.
    pub fn unprefixed(&self) -> &str {
        match &self.prefix {
            Some(prefix) => &self.name[prefix.len() + 2..],
            None => &self.name,
        }
    }

    /// Whether the unprefixed name equals `name`, ignoring ASCII case.
    pub fn matches(&self, name: &str) -> bool {
        self.unprefixed().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn vendor_prefix(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('-')?;
    if rest.starts_with('-') {
        return None;
    }
    let end = rest.find('-')?;
    if end == 0 || end + 1 == rest.len() {
        return None;
    }
    Some(&rest[..end])
}

/// A `property: value` pair. The value is read raw and refined on demand.
#[derive(Debug)]
pub struct Declaration {
    pub meta: Meta,
    pub property: PropertyName,
    pub raw_value: Option<RawSpan>,
    pub value: Option<Shared<PropertyValue>>,
}

impl Declaration {
    pub fn raw(position: Position, property: PropertyName, raw_value: RawSpan) -> Self {
        Self {
            meta: Meta::at(position),
            property,
            raw_value: Some(raw_value),
            value: None,
        }
    }

    /// A synthetic declaration with an already-refined value.
    pub fn synthetic(property: PropertyName, value: Shared<PropertyValue>) -> Self {
        Self {
            meta: Meta::synthetic(),
            property,
            raw_value: None,
            value: Some(value),
        }
    }

    pub fn is_refined(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, &self.raw_value) {
            (Some(value), _) => write!(f, "{}: {}", self.property, value.borrow()),
            (None, Some(raw)) => write!(f, "{}: {}", self.property, raw.content),
            (None, None) => write!(f, "{}:", self.property),
        }
    }
}

syntax_unit!(Declaration, Declaration, |_declaration| SyntaxKind::Declaration);

/// One member of a property value or of a function's argument list.
#[derive(Clone, Debug)]
pub enum ValueMember {
    Term(Shared<Term>),
    Function(Shared<FunctionValue>),
}

impl ValueMember {
    pub fn to_syntax(&self) -> Syntax {
        match self {
            ValueMember::Term(term) => Syntax::from(term.clone()),
            ValueMember::Function(function) => Syntax::from(function.clone()),
        }
    }

    pub fn from_syntax(syntax: &Syntax) -> Option<ValueMember> {
        match syntax {
            Syntax::Term(term) => Some(ValueMember::Term(term.clone())),
            Syntax::FunctionValue(function) => Some(ValueMember::Function(function.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ValueMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMember::Term(term) => write!(f, "{}", term.borrow()),
            ValueMember::Function(function) => write!(f, "{}", function.borrow()),
        }
    }
}

fn write_members(f: &mut fmt::Formatter<'_>, members: &[ValueMember]) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        let is_comma = matches!(
            member,
            ValueMember::Term(term) if term.borrow().kind == TermKind::Operator(',')
        );
        if i > 0 && !is_comma {
            f.write_str(" ")?;
        }
        write!(f, "{member}")?;
    }
    Ok(())
}

/// The refined value of a declaration.
#[derive(Debug, Default)]
pub struct PropertyValue {
    pub meta: Meta,
    pub members: Vec<ValueMember>,
    pub important: bool,
}

impl PropertyValue {
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

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_members(f, &self.members)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

syntax_unit!(PropertyValue, PropertyValue, |_value| SyntaxKind::PropertyValue);

#[derive(Clone, Debug, PartialEq)]
pub enum TermKind {
    Keyword(String),
    Numeric { value: f64, unit: Option<String> },
    String { quote: char, content: String },
    HexColor(String),
    /// `,` or `/`.
    Operator(char),
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Keyword(keyword) => f.write_str(keyword),
            TermKind::Numeric { value, unit } => {
                write!(f, "{value}")?;
                if let Some(unit) = unit {
                    f.write_str(unit)?;
                }
                Ok(())
            }
            TermKind::String { quote, content } => write!(f, "{quote}{content}{quote}"),
            TermKind::HexColor(hex) => write!(f, "#{hex}"),
            TermKind::Operator(op) => write!(f, "{op}"),
        }
    }
}

/// A single value term.
#[derive(Debug)]
pub struct Term {
    pub meta: Meta,
    pub kind: TermKind,
}

impl Term {
    pub fn new(position: Position, kind: TermKind) -> Self {
        Self {
            meta: Meta::at(position),
            kind,
        }
    }

    pub fn synthetic(kind: TermKind) -> Self {
        Self {
            meta: Meta::synthetic(),
            kind,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

syntax_unit!(Term, Term, |term| match term.kind {
    TermKind::Keyword(_) => SyntaxKind::KeywordValue,
    TermKind::Numeric { .. } => SyntaxKind::NumericValue,
    TermKind::String { .. } => SyntaxKind::StringValue,
    TermKind::HexColor(_) => SyntaxKind::HexColorValue,
    TermKind::Operator(_) => SyntaxKind::Operator,
});

/// A function-like value such as `url(a.png)` or `rgba(0, 0, 0, .5)`.
/// The arguments are read raw and refined on demand.
#[derive(Debug)]
pub struct FunctionValue {
    pub meta: Meta,
    pub name: String,
    pub raw_args: Option<RawSpan>,
    pub args: Option<Shared<FunctionArgs>>,
}

impl FunctionValue {
    pub fn raw(position: Position, name: impl Into<String>, raw_args: RawSpan) -> Self {
        Self {
            meta: Meta::at(position),
            name: name.into(),
            raw_args: Some(raw_args),
            args: None,
        }
    }

    pub fn is_refined(&self) -> bool {
        self.args.is_some()
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.args, &self.raw_args) {
            (Some(args), _) => write!(f, "{}({})", self.name, args.borrow()),
            (None, Some(raw)) => write!(f, "{}({})", self.name, raw.content),
            (None, None) => write!(f, "{}()", self.name),
        }
    }
}

syntax_unit!(FunctionValue, FunctionValue, |_function| SyntaxKind::FunctionValue);

#[derive(Clone, Debug)]
pub enum FunctionArgsKind {
    /// A `url()` target with any surrounding quotes removed.
    Url(String),
    Terms(Vec<ValueMember>),
}

/// The refined arguments of a [`FunctionValue`].
#[derive(Debug)]
pub struct FunctionArgs {
    pub meta: Meta,
    pub kind: FunctionArgsKind,
}

impl FunctionArgs {
    pub fn new(position: Position, kind: FunctionArgsKind) -> Self {
        Self {
            meta: Meta::at(position),
            kind,
        }
    }

    pub fn synthetic(kind: FunctionArgsKind) -> Self {
        Self {
            meta: Meta::synthetic(),
            kind,
        }
    }
}

impl fmt::Display for FunctionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FunctionArgsKind::Url(url) => f.write_str(url),
            FunctionArgsKind::Terms(members) => write_members(f, members),
        }
    }
}

syntax_unit!(FunctionArgs, FunctionArgs, |_args| SyntaxKind::FunctionArgs);
