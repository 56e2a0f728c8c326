//! Grammar configuration.
//!
//! Parser units never hard-code delimiters; they ask the [`Grammar`]. A
//! host can adjust a delimiter or the legacy pseudo-element table with the
//! `with_*` builders.

use std::collections::BTreeSet;

use crate::tokens::Token;

/// Pseudo-element names that may be written with a single colon.
pub const LEGACY_PSEUDO_ELEMENTS: [&str; 4] = ["first-line", "first-letter", "before", "after"];

/// At-rules whose block holds declarations rather than statements.
pub const DECLARATION_BLOCK_AT_RULES: [&str; 4] =
    ["font-face", "page", "counter-style", "viewport"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub at_rule_expression_end: Token,
    pub at_rule_termination: Token,
    pub block_begin: Token,
    pub block_end: Token,
    pub selector_delimiter: Token,
    pub selector_end: Token,
    pub property_name_end: Token,
    pub declaration_end: Token,
    pub declaration_delimiter: Token,
    legacy_pseudo_elements: BTreeSet<String>,
    declaration_block_at_rules: BTreeSet<String>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            at_rule_expression_end: Token::AnyOf(";{"),
            at_rule_termination: Token::Semicolon,
            block_begin: Token::OpenBrace,
            block_end: Token::CloseBrace,
            selector_delimiter: Token::Comma,
            selector_end: Token::AnyOf(",{"),
            property_name_end: Token::Colon,
            declaration_end: Token::AnyOf(";}"),
            declaration_delimiter: Token::Semicolon,
            legacy_pseudo_elements: LEGACY_PSEUDO_ELEMENTS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            declaration_block_at_rules: DECLARATION_BLOCK_AT_RULES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the legacy pseudo-element table.
    pub fn with_legacy_pseudo_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legacy_pseudo_elements = names
            .into_iter()
            .map(|name| name.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replaces the set of at-rules whose block holds declarations.
    pub fn with_declaration_block_at_rules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declaration_block_at_rules = names
            .into_iter()
            .map(|name| name.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_selector_end(mut self, token: Token) -> Self {
        self.selector_end = token;
        self
    }

    pub fn with_selector_delimiter(mut self, token: Token) -> Self {
        self.selector_delimiter = token;
        self
    }

    pub fn with_declaration_end(mut self, token: Token) -> Self {
        self.declaration_end = token;
        self
    }

    pub fn with_declaration_delimiter(mut self, token: Token) -> Self {
        self.declaration_delimiter = token;
        self
    }

    pub fn with_property_name_end(mut self, token: Token) -> Self {
        self.property_name_end = token;
        self
    }

    pub fn with_block_delimiters(mut self, begin: Token, end: Token) -> Self {
        self.block_begin = begin;
        self.block_end = end;
        self
    }

    pub fn with_at_rule_delimiters(mut self, expression_end: Token, termination: Token) -> Self {
        self.at_rule_expression_end = expression_end;
        self.at_rule_termination = termination;
        self
    }

    /// Whether a single-colon pseudo selector named `name` is really a
    /// pseudo-element.
    pub fn is_legacy_pseudo_element(&self, name: &str) -> bool {
        self.legacy_pseudo_elements
            .contains(&name.to_ascii_lowercase())
    }

    /// Whether the block of an at-rule named `name` holds declarations.
    pub fn has_declaration_block(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let unprefixed = name
            .strip_prefix('-')
            .and_then(|rest| rest.split_once('-'))
            .map_or(name.as_str(), |(_, rest)| rest);
        self.declaration_block_at_rules.contains(unprefixed)
    }

    pub fn legacy_pseudo_elements(&self) -> impl Iterator<Item = &str> {
        self.legacy_pseudo_elements.iter().map(String::as_str)
    }
}
