//! Error types for the tone DSL compiler.

use std::fmt;

use serde::Serialize;

/// An error recorded while compiling a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileError {
    pub line: usize,
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The automaton could not scan a lexeme.
    Lexical,
    /// The parser had to recover from a malformed derivation.
    Semantic,
    /// A semantic action received values it cannot combine.
    Logical,
}

impl CompileError {
    pub fn lexical(message: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            message: message.into(),
            kind: ErrorKind::Lexical,
        }
    }

    pub fn semantic(message: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            message: message.into(),
            kind: ErrorKind::Semantic,
        }
    }

    pub fn logical(message: impl Into<String>, line: usize) -> Self {
        Self {
            line,
            message: message.into(),
            kind: ErrorKind::Logical,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {:?}: {}", self.line, self.kind, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Ordered accumulator for everything that goes wrong in one compilation.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    errors: Vec<CompileError>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn illegal(&mut self, lookahead: &str, line: usize) {
        self.push(CompileError::semantic(format!("Illegal {lookahead}"), line));
    }

    /// A terminal or nonterminal the parser assumed present.
    pub fn missing(&mut self, what: &str, line: usize) {
        self.push(CompileError::semantic(format!("Missing {what}"), line));
    }

    pub fn unexpected_eof(&mut self, line: usize) {
        self.push(CompileError::semantic("Unexpected EOF", line));
    }

    pub fn logical(&mut self, message: impl Into<String>, line: usize) {
        self.push(CompileError::logical(message, line));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<CompileError> {
        self.errors
    }
}

/// A grammar that cannot drive the predictive parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    Empty,
    /// A non-blank line without `->`, or with an empty side.
    Malformed { line: usize, text: String },
    UnknownAction { line: usize, name: String },
    UndefinedNonTerminal { name: String },
    /// Two alternatives of one nonterminal predict the same lookahead.
    Conflict {
        nonterminal: String,
        lookahead: String,
        first: usize,
        second: usize,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Empty => write!(f, "grammar has no productions"),
            GrammarError::Malformed { line, text } => {
                write!(f, "line {line}: malformed production: {text}")
            }
            GrammarError::UnknownAction { line, name } => {
                write!(f, "line {line}: unknown semantic action: {name}")
            }
            GrammarError::UndefinedNonTerminal { name } => {
                write!(f, "nonterminal {name} has no productions")
            }
            GrammarError::Conflict {
                nonterminal,
                lookahead,
                first,
                second,
            } => write!(
                f,
                "{nonterminal}: alternatives {first} and {second} both predict {lookahead}"
            ),
        }
    }
}

impl std::error::Error for GrammarError {}
