//! Error types for CSS parsing and refinement.
//!
//! Every failure the engine reports is a [`CssError`]: a message code
//! ([`ErrorCode`], whose variants carry the message arguments) plus the
//! source [`Position`] captured where the failure was detected.
//!
//! A parser unit returning `Ok(false)` is *not* an error. That is the
//! ordinary "did not match" signal used for backtracking; `CssError` is
//! only produced once a construct has committed to matching, or when the
//! API itself is misused.

use std::fmt;

use thiserror::Error;

/// A line/column location in the original source. Both are 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Used for errors raised against synthetic nodes, which have no
    /// source position of their own.
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "line {}, column {}", self.line, self.column)
        } else {
            f.write_str("no source position")
        }
    }
}

/// The message code of a [`CssError`], with its arguments.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// The API was called in a way its contract forbids.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("expected to find {0}")]
    ExpectedToFind(String),

    #[error("expected to find closing {0}")]
    ExpectedClosing(String),

    #[error("missing comment close '*/'")]
    MissingCommentClose,

    #[error("expected a valid at-rule name")]
    MissingAtRuleName,

    /// An at-rule with neither an expression nor a block.
    #[error("at-rule '{0}' must have an expression or a block")]
    MissingAtRuleValue(String),

    #[error("expected a selector")]
    ExpectedSelector,

    #[error("expected a selector after the combinator")]
    ExpectedSelectorAfterCombinator,

    #[error("expected a valid id name")]
    ExpectedIdName,

    #[error("expected a valid class name")]
    ExpectedClassName,

    #[error("expected a valid pseudo selector name")]
    ExpectedPseudoName,

    #[error("expected a valid attribute name")]
    ExpectedAttributeName,

    #[error("unable to parse remaining selector content: '{0}'")]
    UnparsableSelector(String),

    #[error("expected a declaration or the end of the block")]
    ExpectedDeclaration,

    #[error("missing value for declaration '{0}'")]
    MissingDeclarationValue(String),

    #[error("unable to parse remaining declaration value: '{0}'")]
    UnparsableDeclarationValue(String),

    #[error("unable to parse remaining content: '{0}'")]
    UnparsableContent(String),

    #[error("invalid hex color '#{0}'")]
    InvalidHexColor(String),

    #[error("expected 'important' after '!'")]
    ExpectedImportant,

    #[error("expected a media query")]
    MissingMediaQuery,

    /// A strategy claimed success without broadcasting its required unit.
    #[error("strategy '{strategy}' reported success but did not broadcast a {expected}")]
    MissingStrategyResult { strategy: String, expected: String },

    /// A strategy returned PARTIAL for a kind that only supports NONE/FULL.
    #[error("strategy '{strategy}' returned a partial refinement for a {kind}")]
    PartialRefinement { strategy: String, kind: String },

    #[error("cannot attach a {child} to a {parent}")]
    CannotAttach { child: String, parent: String },
}

/// A structured, position-annotated parse error.
///
/// # Examples
///
/// ```rust
/// use rcss::parse_stylesheet;
///
/// let err = parse_stylesheet("p { color: red").unwrap_err();
/// assert_eq!(err.position().line, 1);
/// ```
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{code} ({position})")]
pub struct CssError {
    code: ErrorCode,
    position: Position,
}

impl CssError {
    pub fn new(code: ErrorCode, position: Position) -> Self {
        Self { code, position }
    }

    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

// Create a type alias for convenience
pub type Result<T> = std::result::Result<T, CssError>;
