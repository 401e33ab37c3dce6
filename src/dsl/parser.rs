//! Table-driven predictive parser for the tone DSL.
//!
//! Each nonterminal picks the first alternative whose PREDICT set contains the
//! lookahead and walks that alternative's steps. Recovery never backtracks:
//!
//! - a missing terminal is assumed present (insertion);
//! - a nonterminal that cannot start but may be followed by the lookahead is
//!   assumed present (panic-mode deletion);
//! - any other lookahead is reported and skipped, unless it is the end of
//!   input, which stops the parse.

use super::error::{CompileError, ErrorReport};
use super::icg::Icg;
use super::lexer::{Lexer, Scan};
use super::sets::{Lookahead, NonTerminalId, ParseTable, Step};
use super::token::Token;
use super::tree::{ParseTree, TreeBuilder};

/// Whether the parse may go on after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A fatal condition; unwind without doing anything else.
    Halt,
}

/// How a derivation ended: finished, or handing over its trailing nonterminal.
enum Derived {
    Done(Flow),
    Tail(NonTerminalId),
}

#[derive(Debug, Clone)]
enum Current {
    Token(Token),
    End,
}

/// Everything one parse produced.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The value printed by the final statement, even if errors were recorded.
    pub output: Option<String>,
    pub errors: Vec<CompileError>,
    pub tree: Option<ParseTree>,
}

pub struct Parser {
    table: ParseTable,
    lexer: Lexer,
    current: Current,
    errors: ErrorReport,
    icg: Icg,
    tree: TreeBuilder,
}

impl Parser {
    pub fn new(table: ParseTable, source: &str) -> Self {
        Self {
            table,
            lexer: Lexer::new(source),
            current: Current::End,
            errors: ErrorReport::new(),
            icg: Icg::new(),
            tree: TreeBuilder::default(),
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        if self.advance() == Flow::Continue {
            self.expand(self.table.start());
        }

        ParseOutcome {
            output: self.icg.into_output(),
            errors: self.errors.into_vec(),
            tree: self.tree.finish(),
        }
    }

    /// The lookahead as the grammar names it.
    fn lookahead(&self) -> Lookahead {
        match &self.current {
            Current::Token(token) => Lookahead::terminal(token.terminal()),
            Current::End => Lookahead::End,
        }
    }

    fn line(&self) -> usize {
        match &self.current {
            Current::Token(token) => token.line,
            Current::End => self.lexer.line(),
        }
    }

    /// Pull the next significant token, recording lexical errors on the way.
    fn advance(&mut self) -> Flow {
        loop {
            match self.lexer.next_scan() {
                Scan::Token(token) if token.category.is_trivia() => {}
                Scan::Token(token) => {
                    self.current = Current::Token(token);
                    return Flow::Continue;
                }
                Scan::Error(err) => self.errors.push(err),
                Scan::Truncated(err) => {
                    self.errors.push(err);
                    self.current = Current::End;
                    return Flow::Halt;
                }
                Scan::Done => {
                    self.current = Current::End;
                    return Flow::Continue;
                }
            }
        }
    }

    /// Derive `id`. A trailing nonterminal is expanded in this same loop, so
    /// right-recursive chains (statements, `+` and `*` operands) use no stack.
    fn expand(&mut self, id: NonTerminalId) -> Flow {
        let mut id = id;
        let mut opened = 0;
        let flow = loop {
            let alt = match self.select(id) {
                Ok(alt) => alt,
                Err(flow) => break flow,
            };
            self.tree.open(self.table.entry(id).name.clone());
            opened += 1;
            match self.derive(id, alt) {
                Derived::Tail(next) => id = next,
                Derived::Done(flow) => break flow,
            }
        };
        for _ in 0..opened {
            self.tree.close();
        }
        flow
    }

    /// Pick the alternative of `id` predicted by the lookahead, recovering
    /// until one is found. `Err` means `id` is not derived at all.
    fn select(&mut self, id: NonTerminalId) -> Result<usize, Flow> {
        loop {
            let lookahead = self.lookahead();
            let line = self.line();
            let entry = self.table.entry(id);

            if let Some(alt) = entry
                .alternatives
                .iter()
                .position(|a| a.predict.contains(&lookahead))
            {
                return Ok(alt);
            }

            if entry.follow.contains(&lookahead) {
                self.errors.missing(&entry.name, line);
                return Err(Flow::Continue);
            }

            if lookahead == Lookahead::End {
                self.errors.unexpected_eof(line);
                return Err(Flow::Halt);
            }

            self.errors.illegal(&lookahead.to_string(), line);
            if self.advance() == Flow::Halt {
                return Err(Flow::Halt);
            }
        }
    }

    fn derive(&mut self, id: NonTerminalId, alt: usize) -> Derived {
        let len = self.table.entry(id).alternatives[alt].steps.len();
        for i in 0..len {
            let step = self.table.entry(id).alternatives[alt].steps[i].clone();
            let flow = match step {
                Step::Expand(child) if i + 1 == len => return Derived::Tail(child),
                Step::Expand(child) => self.expand(child),
                Step::Consume(terminal) => self.consume(&terminal),
                Step::ExpectEnd => {
                    match self.current {
                        Current::End => self.tree.leaf("$"),
                        Current::Token(_) => {
                            let line = self.line();
                            self.errors.missing("$", line);
                        }
                    }
                    Flow::Continue
                }
                Step::Empty => {
                    self.tree.leaf("epsilon");
                    Flow::Continue
                }
                Step::Fire(action) => {
                    let line = self.line();
                    let lexeme = match &self.current {
                        Current::Token(token) => token.text.as_str(),
                        Current::End => "",
                    };
                    self.icg.perform(action, lexeme, line, &mut self.errors);
                    Flow::Continue
                }
            };
            if flow == Flow::Halt {
                return Derived::Done(Flow::Halt);
            }
        }
        Derived::Done(Flow::Continue)
    }

    fn consume(&mut self, terminal: &str) -> Flow {
        match &self.current {
            Current::Token(token) if token.terminal() == terminal => {
                self.tree.leaf(token.to_string());
                self.advance()
            }
            _ => {
                let line = self.line();
                self.errors.missing(terminal, line);
                Flow::Continue
            }
        }
    }
}
