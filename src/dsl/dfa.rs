//! Lexer automaton.
//!
//! Each token category owns a small sub-automaton built from character-class
//! edge generators. The sub-automata are merged onto one root node in a fixed
//! registration order; when two categories claim the same edge from the root,
//! the earlier one keeps it. Nodes live in an arena owned by the [`Dfa`], so
//! every build is independent of every other build.

use std::collections::HashMap;

use super::token::TokenCategory;

/// Index of a node in a [`Dfa`] arena.
pub type NodeId = usize;

pub const DIGITS: &str = "0123456789";
pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Characters allowed between the quotes of a literal.
pub const TONE_LETTERS: &str = "oOeEaA ";
pub const SYMBOLS: &str = ";()+-*=";
pub const WHITESPACE: &str = " \t\n\r\x0B\x0C";

/// One automaton input: a character or the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Char(char),
    End,
}

impl Input {
    /// Whether this input belongs to the alphabet the automaton classifies.
    ///
    /// A known character that derails a lexeme is handed back to the stream
    /// so it can start the next token.
    pub fn is_known(self) -> bool {
        match self {
            Input::End => true,
            Input::Char(c) => {
                c.is_ascii_alphanumeric()
                    || SYMBOLS.contains(c)
                    || WHITESPACE.contains(c)
                    || c == '/'
                    || c == '"'
            }
        }
    }
}

/// What a final node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Token(TokenCategory),
    Reject(LexErrorKind),
}

/// The kinds of lexical failure a final node can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    InvalidInput,
    InvalidNumber,
    InvalidString,
    UnexpectedEnd,
}

impl LexErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            LexErrorKind::InvalidInput => "Invalid input",
            LexErrorKind::InvalidNumber => "Invalid number",
            LexErrorKind::InvalidString => "Invalid string literal",
            LexErrorKind::UnexpectedEnd => "Unexpected end of input",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    accept: Option<Accept>,
    /// Final nodes whose lexeme always over-reads one separator.
    retract: bool,
    edges: HashMap<Input, NodeId>,
    /// Taken for any character without an explicit edge.
    fallback: Option<NodeId>,
}

/// The merged lexer automaton.
#[derive(Debug, Clone)]
pub struct Dfa {
    nodes: Vec<Node>,
    root: NodeId,
    sink: NodeId,
}

/// A sub-automaton generator: adds its nodes and returns the root edges it claims.
type SubAutomaton = fn(&mut Builder) -> Vec<(Input, NodeId)>;

/// Registration order decides which category keeps a contested root edge.
const CATEGORIES: [SubAutomaton; 6] = [
    number,
    quoted_literal,
    identifier,
    symbol,
    line_comment,
    whitespace,
];

impl Dfa {
    /// Build a fresh automaton for the tone DSL.
    pub fn build() -> Self {
        let mut builder = Builder::default();
        let root = builder.state();
        let sink = builder.accepting(Accept::Reject(LexErrorKind::InvalidInput), false);

        for category in CATEGORIES {
            let edges = category(&mut builder);
            builder.claim(root, edges);
        }

        Self {
            nodes: builder.nodes,
            root,
            sink,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The universal sink every unmatched transition lands on.
    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// Follow one transition.
    pub fn step(&self, from: NodeId, input: Input) -> NodeId {
        let node = &self.nodes[from];
        match node.edges.get(&input) {
            Some(&to) => to,
            None => match (input, node.fallback) {
                (Input::Char(_), Some(to)) => to,
                _ => self.sink,
            },
        }
    }

    pub fn accept(&self, node: NodeId) -> Option<Accept> {
        self.nodes[node].accept
    }

    pub fn retracts(&self, node: NodeId) -> bool {
        self.nodes[node].retract
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Default)]
struct Builder {
    nodes: Vec<Node>,
}

impl Builder {
    fn state(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }

    fn accepting(&mut self, accept: Accept, retract: bool) -> NodeId {
        self.nodes.push(Node {
            accept: Some(accept),
            retract,
            ..Node::default()
        });
        self.nodes.len() - 1
    }

    /// Add edges from `from` to `to`; an input that already has an edge keeps it.
    fn connect(&mut self, from: NodeId, to: NodeId, inputs: impl IntoIterator<Item = Input>) {
        let edges = &mut self.nodes[from].edges;
        for input in inputs {
            edges.entry(input).or_insert(to);
        }
    }

    fn claim(&mut self, from: NodeId, edges: Vec<(Input, NodeId)>) {
        for (input, to) in edges {
            self.connect(from, to, [input]);
        }
    }

    fn fallback(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from].fallback = Some(to);
    }
}

fn chars(set: &str) -> Vec<Input> {
    set.chars().map(Input::Char).collect()
}

/// Every known input, minus the characters in `exclude`.
fn known_except(exclude: &[&str]) -> Vec<Input> {
    let mut inputs = chars(DIGITS);
    inputs.extend(chars(LETTERS));
    inputs.extend(chars(SYMBOLS));
    inputs.extend(chars(WHITESPACE));
    inputs.extend(chars("/\""));
    inputs.push(Input::End);
    inputs.retain(|input| match input {
        Input::Char(c) => !exclude.iter().any(|set| set.contains(*c)),
        Input::End => true,
    });
    inputs
}

fn edges_to(to: NodeId, inputs: Vec<Input>) -> Vec<(Input, NodeId)> {
    inputs.into_iter().map(|input| (input, to)).collect()
}

fn number(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let digits = b.state();
    let done = b.accepting(Accept::Token(TokenCategory::Number), true);
    let malformed = b.accepting(Accept::Reject(LexErrorKind::InvalidNumber), false);

    b.connect(digits, digits, chars(DIGITS));
    b.connect(digits, malformed, chars(LETTERS));
    b.connect(digits, done, known_except(&[DIGITS, LETTERS]));

    edges_to(digits, chars(DIGITS))
}

fn quoted_literal(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let body = b.state();
    let done = b.accepting(Accept::Token(TokenCategory::QuotedLiteral), false);
    let malformed = b.accepting(Accept::Reject(LexErrorKind::InvalidString), false);

    b.connect(body, body, chars(TONE_LETTERS));
    b.connect(body, done, chars("\""));
    // End of input inside a literal is left to the sink: the lexeme is truncated.
    let mut others = known_except(&[TONE_LETTERS, "\""]);
    others.retain(|input| *input != Input::End);
    b.connect(body, malformed, others);

    edges_to(body, chars("\""))
}

fn identifier(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let name = b.state();
    let done = b.accepting(Accept::Token(TokenCategory::Identifier), true);

    b.connect(name, name, chars(LETTERS));
    b.connect(name, name, chars(DIGITS));
    b.connect(name, done, known_except(&[DIGITS, LETTERS]));

    edges_to(name, chars(LETTERS))
}

fn symbol(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let done = b.accepting(Accept::Token(TokenCategory::Symbol), false);
    edges_to(done, chars(SYMBOLS))
}

fn line_comment(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let slash = b.state();
    let body = b.state();
    let done = b.accepting(Accept::Token(TokenCategory::Comment), false);

    b.connect(slash, body, chars("/"));
    b.connect(body, done, [Input::Char('\n'), Input::End]);
    b.fallback(body, body);

    edges_to(slash, chars("/"))
}

fn whitespace(b: &mut Builder) -> Vec<(Input, NodeId)> {
    let done = b.accepting(Accept::Token(TokenCategory::Whitespace), false);
    edges_to(done, chars(WHITESPACE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dfa: &Dfa, text: &str) -> NodeId {
        let mut node = dfa.root();
        for c in text.chars() {
            node = dfa.step(node, Input::Char(c));
            if dfa.accept(node).is_some() {
                break;
            }
        }
        node
    }

    #[test]
    fn number_ends_on_separator_and_retracts() {
        let dfa = Dfa::build();
        let node = run(&dfa, "123;");
        assert_eq!(dfa.accept(node), Some(Accept::Token(TokenCategory::Number)));
        assert!(dfa.retracts(node));
    }

    #[test]
    fn number_followed_by_letter_is_rejected() {
        let dfa = Dfa::build();
        let node = run(&dfa, "12a");
        assert_eq!(
            dfa.accept(node),
            Some(Accept::Reject(LexErrorKind::InvalidNumber))
        );
        assert!(!dfa.retracts(node));
    }

    #[test]
    fn number_accepts_end_of_input() {
        let dfa = Dfa::build();
        let node = run(&dfa, "7");
        let node = dfa.step(node, Input::End);
        assert_eq!(dfa.accept(node), Some(Accept::Token(TokenCategory::Number)));
    }

    #[test]
    fn identifier_allows_trailing_digits() {
        let dfa = Dfa::build();
        let node = run(&dfa, "tone2 ");
        assert_eq!(
            dfa.accept(node),
            Some(Accept::Token(TokenCategory::Identifier))
        );
        assert!(dfa.retracts(node));
    }

    #[test]
    fn quoted_literal_only_takes_tone_letters() {
        let dfa = Dfa::build();
        let node = run(&dfa, "\"oO eE aA\"");
        assert_eq!(
            dfa.accept(node),
            Some(Accept::Token(TokenCategory::QuotedLiteral))
        );

        let node = run(&dfa, "\"ox");
        assert_eq!(
            dfa.accept(node),
            Some(Accept::Reject(LexErrorKind::InvalidString))
        );
    }

    #[test]
    fn unterminated_literal_sinks_at_end() {
        let dfa = Dfa::build();
        let node = run(&dfa, "\"oa");
        assert_eq!(dfa.step(node, Input::End), dfa.sink());
    }

    #[test]
    fn comment_body_takes_any_character() {
        let dfa = Dfa::build();
        let node = run(&dfa, "// ünïcode & symbols @#\n");
        assert_eq!(dfa.accept(node), Some(Accept::Token(TokenCategory::Comment)));
    }

    #[test]
    fn symbols_and_whitespace_are_single_characters() {
        let dfa = Dfa::build();
        for c in SYMBOLS.chars() {
            let node = dfa.step(dfa.root(), Input::Char(c));
            assert_eq!(dfa.accept(node), Some(Accept::Token(TokenCategory::Symbol)));
        }
        for c in WHITESPACE.chars() {
            let node = dfa.step(dfa.root(), Input::Char(c));
            assert_eq!(
                dfa.accept(node),
                Some(Accept::Token(TokenCategory::Whitespace))
            );
        }
    }

    #[test]
    fn unknown_character_goes_to_sink() {
        let dfa = Dfa::build();
        assert_eq!(dfa.step(dfa.root(), Input::Char('@')), dfa.sink());
        assert_eq!(
            dfa.accept(dfa.sink()),
            Some(Accept::Reject(LexErrorKind::InvalidInput))
        );
        assert!(!Input::Char('@').is_known());
        assert!(Input::Char('x').is_known());
    }

    #[test]
    fn earlier_registration_keeps_contested_edge() {
        let mut b = Builder::default();
        let root = b.state();
        let first = b.accepting(Accept::Token(TokenCategory::Number), false);
        let second = b.accepting(Accept::Token(TokenCategory::Identifier), false);
        b.claim(root, vec![(Input::Char('x'), first)]);
        b.claim(root, vec![(Input::Char('x'), second), (Input::Char('y'), second)]);
        assert_eq!(b.nodes[root].edges[&Input::Char('x')], first);
        assert_eq!(b.nodes[root].edges[&Input::Char('y')], second);
    }

    #[test]
    fn builds_are_independent() {
        let a = Dfa::build();
        let b = Dfa::build();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.root(), b.root());
        assert_eq!(a.sink(), b.sink());
    }
}
