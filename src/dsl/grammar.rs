//! Grammar loader.
//!
//! The grammar stays data: a line-oriented production list, parsed once into
//! [`Production`] records. Each line is `LHS -> ALT1 | ALT2 | ...`; repeating
//! an LHS appends alternatives in order. Declaration order matters, since the
//! parser tries alternatives in that order.

use std::fmt;
use std::sync::OnceLock;

use super::error::GrammarError;
use super::icg::Action;

pub const EPSILON: &str = "EPSILON";
pub const END_MARKER: &str = "$";

/// Grammar of the tone DSL.
pub const TONE_GRAMMAR: &str = include_str!("tone.grammar");

/// One right-hand-side symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Literal token text (`/;`) or a token category name (`/ID`).
    Terminal(String),
    NonTerminal(String),
    Action(Action),
    Epsilon,
    End,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "/{t}"),
            Symbol::NonTerminal(name) => write!(f, "{name}"),
            Symbol::Action(action) => write!(f, "{action}"),
            Symbol::Epsilon => write!(f, "{EPSILON}"),
            Symbol::End => write!(f, "{END_MARKER}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<Symbol>,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.lhs)?;
        for symbol in &self.rhs {
            write!(f, " {symbol}")?;
        }
        Ok(())
    }
}

/// An ordered production list. The first production's LHS is the start symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    productions: Vec<Production>,
}

impl Grammar {
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let mut productions = Vec::new();
        // `Action<Name>` words that name no action; fine only if defined as nonterminals.
        let mut unresolved: Vec<(usize, String)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let malformed = || GrammarError::Malformed {
                line,
                text: trimmed.to_string(),
            };
            let (lhs, rhs) = trimmed.split_once("->").ok_or_else(malformed)?;
            let lhs = lhs.trim();
            if lhs.is_empty() || lhs.contains(char::is_whitespace) {
                return Err(malformed());
            }

            for alternative in rhs.split('|') {
                let words: Vec<&str> = alternative.split_whitespace().collect();
                if words.is_empty() {
                    return Err(malformed());
                }
                let rhs: Vec<Symbol> = words.into_iter().map(parse_symbol).collect();
                for symbol in &rhs {
                    if let Symbol::NonTerminal(name) = symbol {
                        if name.starts_with("Action") {
                            unresolved.push((line, name.clone()));
                        }
                    }
                }
                productions.push(Production {
                    lhs: lhs.to_string(),
                    rhs,
                });
            }
        }

        if productions.is_empty() {
            return Err(GrammarError::Empty);
        }

        let grammar = Self { productions };
        let defined = grammar.nonterminals();
        if let Some((line, name)) = unresolved
            .into_iter()
            .find(|(_, name)| !defined.contains(&name.as_str()))
        {
            return Err(GrammarError::UnknownAction { line, name });
        }
        grammar.check_references()?;
        Ok(grammar)
    }

    /// The tone DSL grammar, parsed on first use.
    pub fn tone() -> &'static Grammar {
        static TONE: OnceLock<Grammar> = OnceLock::new();
        TONE.get_or_init(|| Grammar::parse(TONE_GRAMMAR).expect("tone grammar is well formed"))
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn start(&self) -> &str {
        &self.productions[0].lhs
    }

    /// Nonterminal names in order of first declaration.
    pub fn nonterminals(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for production in &self.productions {
            if !names.contains(&production.lhs.as_str()) {
                names.push(&production.lhs);
            }
        }
        names
    }

    fn check_references(&self) -> Result<(), GrammarError> {
        let defined = self.nonterminals();
        for production in &self.productions {
            for symbol in &production.rhs {
                if let Symbol::NonTerminal(name) = symbol {
                    if !defined.contains(&name.as_str()) {
                        return Err(GrammarError::UndefinedNonTerminal { name: name.clone() });
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_symbol(word: &str) -> Symbol {
    if let Some(terminal) = word.strip_prefix('/') {
        return Symbol::Terminal(terminal.to_string());
    }
    if word == EPSILON {
        return Symbol::Epsilon;
    }
    if word == END_MARKER {
        return Symbol::End;
    }
    match word.strip_prefix("Action").map(str::parse::<Action>) {
        Some(Ok(action)) => Symbol::Action(action),
        _ => Symbol::NonTerminal(word.to_string()),
    }
}
