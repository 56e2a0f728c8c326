//! Character predicates for grammar symbols.
//!
//! A [`Token`] answers a single question: does this character belong to
//! the symbol? Tokens hold no state, so they are `Copy` and can be stored
//! freely in a [`Grammar`](crate::grammar::Grammar).

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    DoubleQuote,
    SingleQuote,
    Escape,
    Colon,
    Semicolon,
    Comma,
    Hash,
    Dot,
    Star,
    ForwardSlash,
    At,
    Hyphen,
    Plus,
    Tilde,
    GreaterThan,
    Exclamation,
    Whitespace,
    Digit,
    HexDigit,
    /// Characters that may start an identifier.
    NameStart,
    /// Characters that may continue an identifier.
    NameChar,
    /// Either quote character.
    Quote,
    /// Exactly this character.
    Literal(char),
    /// Any of these characters.
    AnyOf(&'static str),
}

impl Token {
    /// Whether `c` is an instance of this token. `None` (end of input)
    /// never matches.
    pub fn matches(self, c: Option<char>) -> bool {
        let Some(c) = c else {
            return false;
        };
        match self {
            Token::OpenParen => c == '(',
            Token::CloseParen => c == ')',
            Token::OpenBracket => c == '[',
            Token::CloseBracket => c == ']',
            Token::OpenBrace => c == '{',
            Token::CloseBrace => c == '}',
            Token::DoubleQuote => c == '"',
            Token::SingleQuote => c == '\'',
            Token::Escape => c == '\\',
            Token::Colon => c == ':',
            Token::Semicolon => c == ';',
            Token::Comma => c == ',',
            Token::Hash => c == '#',
            Token::Dot => c == '.',
            Token::Star => c == '*',
            Token::ForwardSlash => c == '/',
            Token::At => c == '@',
            Token::Hyphen => c == '-',
            Token::Plus => c == '+',
            Token::Tilde => c == '~',
            Token::GreaterThan => c == '>',
            Token::Exclamation => c == '!',
            Token::Whitespace => matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'),
            Token::Digit => c.is_ascii_digit(),
            Token::HexDigit => c.is_ascii_hexdigit(),
            Token::NameStart => c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii(),
            Token::NameChar => {
                c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
            }
            Token::Quote => c == '"' || c == '\'',
            Token::Literal(expected) => c == expected,
            Token::AnyOf(set) => set.contains(c),
        }
    }

    /// Whether this token recognizes a quote character.
    pub fn is_quote(self) -> bool {
        matches!(
            self,
            Token::DoubleQuote | Token::SingleQuote | Token::Quote | Token::Literal('"' | '\'')
        )
    }

    /// The quote token for a quote character, if `c` is one.
    pub fn quote_for(c: char) -> Option<Token> {
        match c {
            '"' => Some(Token::DoubleQuote),
            '\'' => Some(Token::SingleQuote),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::OpenBracket => f.write_str("'['"),
            Token::CloseBracket => f.write_str("']'"),
            Token::OpenBrace => f.write_str("'{'"),
            Token::CloseBrace => f.write_str("'}'"),
            Token::DoubleQuote => f.write_str("'\"'"),
            Token::SingleQuote => f.write_str("\"'\""),
            Token::Escape => f.write_str("escape '\\'"),
            Token::Colon => f.write_str("':'"),
            Token::Semicolon => f.write_str("';'"),
            Token::Comma => f.write_str("','"),
            Token::Hash => f.write_str("'#'"),
            Token::Dot => f.write_str("'.'"),
            Token::Star => f.write_str("'*'"),
            Token::ForwardSlash => f.write_str("'/'"),
            Token::At => f.write_str("'@'"),
            Token::Hyphen => f.write_str("'-'"),
            Token::Plus => f.write_str("'+'"),
            Token::Tilde => f.write_str("'~'"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::Exclamation => f.write_str("'!'"),
            Token::Whitespace => f.write_str("whitespace"),
            Token::Digit => f.write_str("digit"),
            Token::HexDigit => f.write_str("hex digit"),
            Token::NameStart => f.write_str("identifier start"),
            Token::NameChar => f.write_str("identifier character"),
            Token::Quote => f.write_str("quote"),
            Token::Literal(c) => write!(f, "'{c}'"),
            Token::AnyOf(set) => {
                let quoted: Vec<String> = set.chars().map(|c| format!("'{c}'")).collect();
                f.write_str(&quoted.join(" or "))
            }
        }
    }
}
