//! Token types for the tone DSL lexer.

use std::fmt;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub category: TokenCategory,
    pub text: String,
    pub line: usize,
}

/// The category of a token, fixed by the automaton final node that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenCategory {
    Number,
    Identifier,
    Symbol,
    Comment,
    Whitespace,
    QuotedLiteral,
}

impl TokenCategory {
    /// The name the grammar uses for this category.
    pub fn name(self) -> &'static str {
        match self {
            TokenCategory::Number => "NUMBER",
            TokenCategory::Identifier => "ID",
            TokenCategory::Symbol => "SYMBOL",
            TokenCategory::Comment => "COMMENT",
            TokenCategory::Whitespace => "WHITE_SPACE",
            TokenCategory::QuotedLiteral => "STATIC_STRING",
        }
    }

    /// Whitespace and comments never reach the parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenCategory::Whitespace | TokenCategory::Comment)
    }
}

impl Token {
    /// The terminal this token matches in the grammar.
    ///
    /// Punctuation matches by its text; identifiers, numbers and literals
    /// match by category name.
    pub fn terminal(&self) -> &str {
        match self.category {
            TokenCategory::Symbol => &self.text,
            other => other.name(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.category.name(), self.text)
    }
}
