//! Character cursor over CSS source text.
//!
//! The [`Cursor`] reads a source one character at a time, tracking the
//! current line and column, whether the current character is inside a
//! quoted string, and any comments collected along the way. Parser units
//! use [`Cursor::snapshot`] / [`Cursor::restore`] to backtrack when a
//! speculative match fails.
//!
//! A cursor may be anchored: a cursor opened over a [`RawSpan`] starts at
//! the span's line and column, so every position it reports refers to the
//! original document.

use std::fmt;
use std::mem;

use crate::ast::RawSpan;
use crate::error::{CssError, ErrorCode, Position, Result};
use crate::tokens::Token;

/// A captured cursor state. Restoring it with [`Cursor::restore`] puts the
/// cursor back exactly where it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub index: usize,
    pub line: usize,
    pub column: usize,
    pub in_string: bool,
    quote: Option<char>,
}

impl Snapshot {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Reads a source string one character at a time.
///
/// # Examples
///
/// ```rust
/// use rcss::cursor::Cursor;
/// use rcss::tokens::Token;
///
/// let mut cursor = Cursor::new("(a(b)c)d");
/// let inner = cursor.chomp_enclosed_value(Token::OpenParen, Token::CloseParen).unwrap();
/// assert_eq!(inner, "a(b)c");
/// assert_eq!(cursor.current(), Some('d'));
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
    anchor_line: usize,
    anchor_column: usize,
    track_strings: bool,
    in_string: bool,
    quote: Option<char>,
    last_whitespace_check: Option<usize>,
    last_comment_check: Option<usize>,
    comments: Vec<String>,
}

impl Cursor {
    /// Creates a cursor over `source`, starting at line 1, column 1.
    pub fn new(source: &str) -> Self {
        Self::anchored(source, 1, 1, true)
    }

    /// Creates a cursor over the content of a raw span, anchored at the
    /// span's original position.
    pub fn from_raw(raw: &RawSpan) -> Self {
        Self::anchored(&raw.content, raw.line, raw.column, true)
    }

    /// Creates a cursor whose first character is at `line`/`column` of the
    /// original document. With `track_strings` off the in-string flag is
    /// never updated, which skips work for content known to hold no quotes.
    pub fn anchored(source: &str, line: usize, column: usize, track_strings: bool) -> Self {
        let mut cursor = Self {
            chars: source.chars().collect(),
            index: 0,
            line,
            column,
            anchor_line: line,
            anchor_column: column,
            track_strings,
            in_string: false,
            quote: None,
            last_whitespace_check: None,
            last_comment_check: None,
            comments: Vec::new(),
        };
        if track_strings {
            cursor.update_in_string();
        }
        cursor
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn anchor(&self) -> Position {
        Position::new(self.anchor_line, self.anchor_column)
    }

    /// Whether this cursor reads an extracted span rather than a whole
    /// document.
    pub fn is_sub_cursor(&self) -> bool {
        self.anchor_line != 1 || self.anchor_column != 1
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// The full source text.
    pub fn source(&self) -> String {
        self.chars.iter().collect()
    }

    /// Everything from the current character to the end, without
    /// advancing.
    pub fn remaining(&self) -> String {
        self.slice(self.index, self.chars.len())
    }

    pub fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// The character `offset` positions ahead of the current one.
    /// `peek(0)` is the current character.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    pub fn peek_previous(&self) -> Option<char> {
        if self.index == 0 {
            None
        } else {
            self.chars.get(self.index - 1).copied()
        }
    }

    /// Whether the character immediately before the current one is the
    /// escape symbol.
    pub fn is_escaped(&self) -> bool {
        Token::Escape.matches(self.peek_previous())
    }

    /// Advances one character and returns the new current character.
    pub fn next(&mut self) -> Option<char> {
        let current = self.current()?;

        if current == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.index += 1;

        if self.track_strings {
            self.update_in_string();
        }
        self.current()
    }

    /// Advances until the cursor reaches `target`. Does nothing if the
    /// cursor is already past it.
    pub fn forward(&mut self, target: usize) -> Result<()> {
        if target > self.chars.len() {
            return Err(self.error(ErrorCode::IllegalArgument(format!(
                "cannot forward to index {target}, source length is {}",
                self.chars.len()
            ))));
        }
        while self.index < target {
            self.next();
        }
        Ok(())
    }

    /// Skips the current character and every following whitespace
    /// character.
    pub fn skip_whitespace(&mut self) {
        if self.last_whitespace_check == Some(self.index) {
            return;
        }
        self.last_whitespace_check = Some(self.index);

        while Token::Whitespace.matches(self.current()) {
            self.next();
        }
    }

    /// Advances past the current character only if it matches `token`.
    pub fn optional(&mut self, token: Token) -> Option<char> {
        let current = self.current();
        if !token.matches(current) {
            return None;
        }
        self.next();
        current
    }

    /// Same as [`optional`](Self::optional), when the character itself is
    /// not needed.
    pub fn optionally_present(&mut self, token: Token) -> bool {
        self.optional(token).is_some()
    }

    /// Requires the current character to match `token`, then advances.
    pub fn expect(&mut self, token: Token) -> Result<()> {
        if !token.matches(self.current()) {
            return Err(self.error(ErrorCode::ExpectedToFind(token.to_string())));
        }
        self.next();
        Ok(())
    }

    /// Collects characters until an unescaped occurrence of `token` that is
    /// outside of any string and any parentheses. The terminator itself is
    /// not consumed. If the token is never found the rest of the source is
    /// returned.
    ///
    /// `token` must not match a parenthesis; use
    /// [`chomp_enclosed_value`](Self::chomp_enclosed_value) for those.
    pub fn until(&mut self, token: Token) -> Result<String> {
        if token.matches(Some('(')) || token.matches(Some(')')) {
            return Err(self.error(ErrorCode::IllegalArgument(format!(
                "until cannot match {token}, use chomp_enclosed_value instead"
            ))));
        }

        let start = self.index;
        let mut depth = 0usize;

        while let Some(current) = self.current() {
            if !self.in_string && !self.is_escaped() {
                if current == '(' {
                    depth += 1;
                } else if current == ')' && depth > 0 {
                    depth -= 1;
                } else if depth == 0 && token.matches(Some(current)) {
                    return Ok(self.slice(start, self.index));
                }
            }
            self.next();
        }

        Ok(self.slice(start, self.index))
    }

    /// Consumes the longest run of characters matching `token`.
    pub fn chomp(&mut self, token: Token) -> String {
        let start = self.index;
        while token.matches(self.current()) {
            self.next();
        }
        self.slice(start, self.index)
    }

    /// Consumes a value delimited by `open` and `close`, returning the
    /// content between them and leaving the cursor just past the closing
    /// delimiter.
    ///
    /// The opening token must be at the current position. Nesting is
    /// tracked only when the two delimiters differ. String content is
    /// skipped as opaque unless the closing token is itself a quote.
    pub fn chomp_enclosed_value(&mut self, open: Token, close: Token) -> Result<String> {
        self.expect(open)?;

        let start = self.index;
        let mut level = 1usize;
        let allow_nesting = open != close;
        let skip_strings = !close.is_quote();

        while !self.eof() {
            if skip_strings && self.in_string {
                self.next();
                continue;
            }

            let current = self.current();
            if allow_nesting && open.matches(current) && !self.is_escaped() {
                level += 1;
            } else if close.matches(current) && !self.is_escaped() {
                level -= 1;
                if level == 0 {
                    let content = self.slice(start, self.index);
                    self.next();
                    return Ok(content);
                }
            }
            self.next();
        }

        Err(self.error(ErrorCode::ExpectedClosing(close.to_string())))
    }

    /// Reads an identifier at the current position.
    ///
    /// An identifier may not begin with a hyphen followed by a digit.
    /// Custom property names (`--name`) are accepted.
    pub fn read_ident(&mut self) -> Option<String> {
        let current = self.current();
        if !Token::NameStart.matches(current) {
            return None;
        }
        if Token::Hyphen.matches(current) && Token::Digit.matches(self.peek(1)) {
            return None;
        }
        if Token::Hyphen.matches(current)
            && Token::Hyphen.matches(self.peek(1))
            && !Token::NameChar.matches(self.peek(2))
        {
            return None;
        }
        Some(self.chomp(Token::NameChar))
    }

    /// Buffers every comment at the current position, optionally skipping
    /// whitespace before, between and after them. Calling this again at the
    /// same index is free.
    ///
    /// Buffered comments stay available until [`flush_comments`] is
    /// called, so a parser that collects comments and then fails to match
    /// leaves them for the next parser.
    ///
    /// [`flush_comments`]: Self::flush_comments
    pub fn collect_comments(&mut self, skip_whitespace: bool) -> Result<&mut Self> {
        if self.last_comment_check == Some(self.index) {
            return Ok(self);
        }
        self.last_comment_check = Some(self.index);

        while !self.eof() {
            if skip_whitespace {
                self.skip_whitespace();
            }
            match self.read_comment()? {
                Some(comment) => self.comments.push(comment),
                None => break,
            }
        }
        Ok(self)
    }

    /// Drains the comment buffer.
    pub fn flush_comments(&mut self) -> Vec<String> {
        mem::take(&mut self.comments)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            index: self.index,
            line: self.line,
            column: self.column,
            in_string: self.in_string,
            quote: self.quote,
        }
    }

    /// Puts the cursor back to the captured state. Source text and the
    /// comment buffer are untouched; comments already buffered are not
    /// collected a second time.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.index = snapshot.index;
        self.line = snapshot.line;
        self.column = snapshot.column;
        self.in_string = snapshot.in_string;
        self.quote = snapshot.quote;
        self.last_whitespace_check = None;
    }

    /// An error located at the current position.
    pub fn error(&self, code: ErrorCode) -> CssError {
        CssError::new(code, self.position())
    }

    fn read_comment(&mut self) -> Result<Option<String>> {
        if !(Token::ForwardSlash.matches(self.current()) && Token::Star.matches(self.peek(1))) {
            return Ok(None);
        }

        // comment bodies are opaque to string tracking
        let string_state = (self.in_string, self.quote);
        let start = self.index;
        self.forward(start + 2)?;

        loop {
            if Token::ForwardSlash.matches(self.current())
                && Token::Star.matches(self.peek_previous())
                && self.index > start + 2
            {
                let comment = self.slice(start + 2, self.index - 1);
                self.in_string = string_state.0;
                self.quote = string_state.1;
                self.next();
                return Ok(Some(comment));
            }
            if self.eof() {
                return Err(self.error(ErrorCode::MissingCommentClose));
            }
            self.next();
        }
    }

    fn update_in_string(&mut self) {
        let Some(current) = self.current() else {
            return;
        };
        if !Token::Quote.matches(Some(current)) || self.is_escaped() {
            return;
        }

        match self.quote {
            Some(active) if active == current => {
                self.in_string = false;
                self.quote = None;
            }
            Some(_) => {}
            None => {
                self.in_string = true;
                self.quote = Some(current);
            }
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{00BB}{}", self.slice(0, self.index), self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.next();
        cursor.next();
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        cursor.next();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        assert_eq!(cursor.current(), Some('c'));
    }

    #[test]
    fn next_at_end_returns_none() {
        let mut cursor = Cursor::new("a");
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.next(), None);
        assert!(cursor.eof());
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn peek_bounds() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(1), Some('b'));
        assert_eq!(cursor.peek(2), None);
        assert_eq!(cursor.peek_previous(), None);
    }

    #[test]
    fn forward_behind_is_noop() {
        let mut cursor = Cursor::new("abcdef");
        cursor.forward(4).unwrap();
        cursor.forward(2).unwrap();
        assert_eq!(cursor.index(), 4);
    }

    #[test]
    fn forward_past_end_is_rejected() {
        let mut cursor = Cursor::new("abc");
        let err = cursor.forward(4).unwrap_err();
        assert!(matches!(err.code(), ErrorCode::IllegalArgument(_)));
    }

    #[test]
    fn in_string_ignores_other_quote_kind() {
        let mut cursor = Cursor::new("\"it's\";x");
        let value = cursor.until(Token::Semicolon).unwrap();
        assert_eq!(value, "\"it's\"");
        assert!(!cursor.in_string());
    }

    #[test]
    fn until_skips_nested_parens() {
        let mut cursor = Cursor::new("a(b(;)c;)d;e");
        assert_eq!(cursor.until(Token::Semicolon).unwrap(), "a(b(;)c;)d");
    }

    #[test]
    fn until_rejects_paren_tokens() {
        let mut cursor = Cursor::new("a(b)");
        let err = cursor.until(Token::CloseParen).unwrap_err();
        assert!(matches!(err.code(), ErrorCode::IllegalArgument(_)));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn chomp_returns_empty_without_match() {
        let mut cursor = Cursor::new("abc");
        assert_eq!(cursor.chomp(Token::Digit), "");
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn enclosed_value_with_quotes_does_not_nest() {
        let mut cursor = Cursor::new("'a(b'c");
        let value = cursor
            .chomp_enclosed_value(Token::SingleQuote, Token::SingleQuote)
            .unwrap();
        assert_eq!(value, "a(b");
        assert_eq!(cursor.current(), Some('c'));
    }

    #[test]
    fn enclosed_value_skips_strings() {
        let mut cursor = Cursor::new("(a \")\" b)");
        let value = cursor
            .chomp_enclosed_value(Token::OpenParen, Token::CloseParen)
            .unwrap();
        assert_eq!(value, "a \")\" b");
        assert!(cursor.eof());
    }

    #[test]
    fn comment_quotes_do_not_open_strings() {
        let mut cursor = Cursor::new("/* don't */a;b");
        cursor.collect_comments(true).unwrap();
        assert!(!cursor.in_string());
        assert_eq!(cursor.flush_comments(), vec![" don't ".to_string()]);
        assert_eq!(cursor.until(Token::Semicolon).unwrap(), "a");
    }

    #[test]
    fn untracked_strings_stay_outside() {
        let mut cursor = Cursor::anchored("'a;b';c", 4, 2, false);
        assert_eq!(cursor.until(Token::Semicolon).unwrap(), "'a");
        assert_eq!(cursor.position(), Position::new(4, 4));
        assert!(cursor.is_sub_cursor());
    }

    #[test]
    fn read_ident_rules() {
        assert_eq!(Cursor::new("-1px").read_ident(), None);
        assert_eq!(Cursor::new("--main").read_ident(), Some("--main".into()));
        assert_eq!(Cursor::new("-webkit-x y").read_ident(), Some("-webkit-x".into()));
        assert_eq!(Cursor::new("9a").read_ident(), None);
    }

    #[test]
    fn display_marks_position() {
        let mut cursor = Cursor::new("abc");
        cursor.next();
        assert_eq!(cursor.to_string(), "a\u{00BB}bc");
    }
}
