//! Tone DSL compiler: source text to tokens, LL(1) derivation and tone string.
//!
//! The front end is built from data: a DFA merged from per-category
//! sub-automata drives the lexer, and a declarative grammar with embedded
//! semantic actions drives the parser and the evaluator.

pub mod dfa;
pub mod error;
pub mod grammar;
pub mod icg;
pub mod lexer;
pub mod parser;
pub mod sets;
pub mod token;
pub mod tree;

use std::sync::OnceLock;

use serde::Serialize;

pub use error::{CompileError, ErrorKind, GrammarError};
pub use grammar::Grammar;
pub use sets::ParseTable;
pub use token::{Token, TokenCategory};
pub use tree::ParseTree;

use lexer::Lexer;
use parser::Parser;

/// The result of compiling one program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    /// Present only when no error of any kind was recorded.
    #[serde(rename = "finalResult")]
    pub final_result: Option<String>,
    #[serde(rename = "compilationErrors")]
    pub errors: Vec<CompileError>,
    #[serde(skip)]
    pub tree: Option<ParseTree>,
}

impl Compilation {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.final_result.is_some()
    }
}

/// The DSL compiler.
///
/// Holds a prebuilt parse table; every compilation works on its own copy of
/// the table, a fresh automaton and fresh evaluator state.
#[derive(Debug, Clone)]
pub struct Compiler {
    table: ParseTable,
}

impl Compiler {
    /// A compiler for the tone grammar.
    pub fn new() -> Self {
        Self {
            table: tone_table().clone(),
        }
    }

    /// A compiler for another grammar over the same token categories and actions.
    pub fn with_grammar(text: &str) -> Result<Self, GrammarError> {
        let grammar = Grammar::parse(text)?;
        Ok(Self {
            table: ParseTable::build(&grammar)?,
        })
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Compile source text. Malformed input is reported, never panicked on.
    pub fn compile(&self, source: &str) -> Compilation {
        let outcome = Parser::new(self.table.clone(), source).parse();
        let final_result = if outcome.errors.is_empty() {
            outcome.output
        } else {
            None
        };
        Compilation {
            final_result,
            errors: outcome.errors,
            tree: outcome.tree,
        }
    }

    /// Scan source text into tokens, trivia included.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<CompileError>) {
        Lexer::new(source).tokenize()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn tone_table() -> &'static ParseTable {
    static TABLE: OnceLock<ParseTable> = OnceLock::new();
    TABLE.get_or_init(|| ParseTable::build(Grammar::tone()).expect("tone grammar is LL(1)"))
}

/// Compile with the tone grammar.
pub fn compile(source: &str) -> Compilation {
    Compiler::new().compile(source)
}
