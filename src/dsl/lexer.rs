//! Lexer for the tone DSL.
//!
//! Scans one token at a time with maximal munch over the merged [`Dfa`].
//! Errors never stop scanning, except a lexeme cut short by the end of input.

use super::dfa::{Accept, Dfa, Input, LexErrorKind};
use super::error::CompileError;
use super::token::Token;

/// The outcome of one scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Scan {
    Token(Token),
    /// A lexeme the automaton rejected; scanning can continue.
    Error(CompileError),
    /// End of input arrived mid-lexeme; scanning is over.
    Truncated(CompileError),
    Done,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    dfa: Dfa,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            dfa: Dfa::build(),
        }
    }

    /// The line the next lexeme starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn next_scan(&mut self) -> Scan {
        let start = self.pos;
        let line = self.line;
        let mut node = self.dfa.root();

        loop {
            let input = self.read();
            if input == Input::End && self.pos == start {
                return Scan::Done;
            }

            let next = self.dfa.step(node, input);
            if next == self.dfa.sink() {
                if input == Input::End {
                    let message = format!(
                        "{}: {}",
                        LexErrorKind::UnexpectedEnd.message(),
                        self.lexeme(start)
                    );
                    return Scan::Truncated(CompileError::lexical(message, line));
                }
                // Hand the derailing character back unless it is the whole lexeme.
                if input.is_known() && self.pos - start > 1 {
                    self.unread();
                }
                let message = format!(
                    "{}: {}",
                    LexErrorKind::InvalidInput.message(),
                    self.lexeme(start)
                );
                return Scan::Error(CompileError::lexical(message, line));
            }

            node = next;
            let Some(accept) = self.dfa.accept(node) else {
                continue;
            };
            if self.dfa.retracts(node) && input != Input::End {
                self.unread();
            }
            let text = self.lexeme(start);
            return match accept {
                Accept::Token(category) => Scan::Token(Token {
                    category,
                    text,
                    line,
                }),
                Accept::Reject(kind) => Scan::Error(CompileError::lexical(
                    format!("{}: {text}", kind.message()),
                    line,
                )),
            };
        }
    }

    /// Drain the whole input, including trivia tokens.
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<CompileError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            match self.next_scan() {
                Scan::Token(token) => tokens.push(token),
                Scan::Error(err) => errors.push(err),
                Scan::Truncated(err) => {
                    errors.push(err);
                    break;
                }
                Scan::Done => break,
            }
        }

        (tokens, errors)
    }

    fn read(&mut self) -> Input {
        let Some(&ch) = self.chars.get(self.pos) else {
            return Input::End;
        };
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Input::Char(ch)
    }

    fn unread(&mut self) {
        self.pos -= 1;
        if self.chars[self.pos] == '\n' {
            self.line -= 1;
        }
    }

    fn lexeme(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }
}
