//! FIRST / FOLLOW / PREDICT computation and the parse table built from them.
//!
//! All three are fixed points over the production list: every pass recomputes
//! each set from the current ones, and iteration stops after a pass in which
//! nothing grew. Sets are ordered so repeated builds render identically.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::error::GrammarError;
use super::grammar::{Grammar, Production, Symbol, END_MARKER, EPSILON};
use super::icg::Action;

/// A member of a FIRST, FOLLOW or PREDICT set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lookahead {
    Terminal(String),
    End,
    /// The empty-sequence marker; only ever found in FIRST sets.
    Empty,
}

impl Lookahead {
    pub fn terminal(text: impl Into<String>) -> Self {
        Lookahead::Terminal(text.into())
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookahead::Terminal(t) => write!(f, "{t}"),
            Lookahead::End => write!(f, "{END_MARKER}"),
            Lookahead::Empty => write!(f, "{EPSILON}"),
        }
    }
}

pub type LookaheadSet = BTreeSet<Lookahead>;

pub type NonTerminalId = usize;

/// One link of a derivation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Consume(String),
    ExpectEnd,
    Expand(NonTerminalId),
    Empty,
    Fire(Action),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub production: Production,
    pub predict: LookaheadSet,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminalEntry {
    pub name: String,
    pub first: LookaheadSet,
    pub follow: LookaheadSet,
    /// In declaration order; the parser takes the first whose PREDICT matches.
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    entries: Vec<NonTerminalEntry>,
    index: HashMap<String, NonTerminalId>,
    start: NonTerminalId,
}

impl ParseTable {
    /// Build the table and reject grammars that are not LL(1).
    pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
        let table = Self::compute(grammar);
        match table.conflicts().into_iter().next() {
            Some(conflict) => Err(conflict),
            None => Ok(table),
        }
    }

    fn compute(grammar: &Grammar) -> Self {
        let first = first_sets(grammar);
        let follow = follow_sets(grammar, &first);

        let names = grammar.nonterminals();
        let index: HashMap<String, NonTerminalId> = names
            .iter()
            .enumerate()
            .map(|(id, name)| (name.to_string(), id))
            .collect();

        let mut entries: Vec<NonTerminalEntry> = names
            .iter()
            .map(|name| NonTerminalEntry {
                name: name.to_string(),
                first: first.get(*name).cloned().unwrap_or_default(),
                follow: follow.get(*name).cloned().unwrap_or_default(),
                alternatives: Vec::new(),
            })
            .collect();

        for production in grammar.productions() {
            let steps = production
                .rhs
                .iter()
                .map(|symbol| match symbol {
                    Symbol::Terminal(t) => Step::Consume(t.clone()),
                    Symbol::End => Step::ExpectEnd,
                    Symbol::NonTerminal(name) => Step::Expand(index[name]),
                    Symbol::Epsilon => Step::Empty,
                    Symbol::Action(action) => Step::Fire(*action),
                })
                .collect();
            let id = index[&production.lhs];
            entries[id].alternatives.push(Alternative {
                production: production.clone(),
                predict: predict_set(production, &first, &follow),
                steps,
            });
        }

        let start = index[grammar.start()];
        Self {
            entries,
            index,
            start,
        }
    }

    /// Every pair of sibling alternatives whose PREDICT sets intersect.
    pub fn conflicts(&self) -> Vec<GrammarError> {
        let mut conflicts = Vec::new();
        for entry in &self.entries {
            for (i, a) in entry.alternatives.iter().enumerate() {
                for (j, b) in entry.alternatives.iter().enumerate().skip(i + 1) {
                    if let Some(shared) = a.predict.intersection(&b.predict).next() {
                        conflicts.push(GrammarError::Conflict {
                            nonterminal: entry.name.clone(),
                            lookahead: shared.to_string(),
                            first: i,
                            second: j,
                        });
                    }
                }
            }
        }
        conflicts
    }

    pub fn start(&self) -> NonTerminalId {
        self.start
    }

    pub fn entry(&self, id: NonTerminalId) -> &NonTerminalEntry {
        &self.entries[id]
    }

    pub fn get(&self, name: &str) -> Option<&NonTerminalEntry> {
        self.index.get(name).map(|&id| &self.entries[id])
    }

    pub fn entries(&self) -> &[NonTerminalEntry] {
        &self.entries
    }
}

impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.name)?;
            writeln!(f, "  FIRST:   {}", render(&entry.first))?;
            writeln!(f, "  FOLLOW:  {}", render(&entry.follow))?;
            for alt in &entry.alternatives {
                writeln!(f, "  PREDICT: {{{}}}  {}", render(&alt.predict), alt.production)?;
            }
        }
        Ok(())
    }
}

fn render(set: &LookaheadSet) -> String {
    set.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(" ")
}

/// FIRST of a symbol sequence: ends with [`Lookahead::Empty`] iff every symbol is nullable.
pub fn first_of(sequence: &[Symbol], first: &HashMap<String, LookaheadSet>) -> LookaheadSet {
    let mut out = LookaheadSet::new();
    for symbol in sequence {
        let nullable = match symbol {
            Symbol::Terminal(t) => {
                out.insert(Lookahead::Terminal(t.clone()));
                false
            }
            Symbol::End => {
                out.insert(Lookahead::End);
                false
            }
            // Actions derive nothing, so they are transparent to lookahead.
            Symbol::Epsilon | Symbol::Action(_) => true,
            Symbol::NonTerminal(name) => match first.get(name) {
                Some(set) => {
                    out.extend(set.iter().filter(|l| **l != Lookahead::Empty).cloned());
                    set.contains(&Lookahead::Empty)
                }
                None => false,
            },
        };
        if !nullable {
            return out;
        }
    }
    out.insert(Lookahead::Empty);
    out
}

pub fn first_sets(grammar: &Grammar) -> HashMap<String, LookaheadSet> {
    let mut first: HashMap<String, LookaheadSet> = grammar
        .nonterminals()
        .into_iter()
        .map(|name| (name.to_string(), LookaheadSet::new()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            let found = first_of(&production.rhs, &first);
            let set = first.entry(production.lhs.clone()).or_default();
            let before = set.len();
            set.extend(found);
            changed |= set.len() != before;
        }
    }
    first
}

pub fn follow_sets(
    grammar: &Grammar,
    first: &HashMap<String, LookaheadSet>,
) -> HashMap<String, LookaheadSet> {
    let mut follow: HashMap<String, LookaheadSet> = grammar
        .nonterminals()
        .into_iter()
        .map(|name| (name.to_string(), LookaheadSet::new()))
        .collect();
    follow
        .entry(grammar.start().to_string())
        .or_default()
        .insert(Lookahead::End);

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            for (i, symbol) in production.rhs.iter().enumerate() {
                let Symbol::NonTerminal(name) = symbol else {
                    continue;
                };
                let rest = first_of(&production.rhs[i + 1..], first);
                let mut found: Vec<Lookahead> = rest
                    .iter()
                    .filter(|l| **l != Lookahead::Empty)
                    .cloned()
                    .collect();
                if rest.contains(&Lookahead::Empty) {
                    if let Some(lhs_follow) = follow.get(&production.lhs) {
                        found.extend(lhs_follow.iter().cloned());
                    }
                }
                let set = follow.entry(name.clone()).or_default();
                let before = set.len();
                set.extend(found);
                changed |= set.len() != before;
            }
        }
    }
    follow
}

/// FIRST of the right-hand side, plus FOLLOW of the left when it can vanish.
pub fn predict_set(
    production: &Production,
    first: &HashMap<String, LookaheadSet>,
    follow: &HashMap<String, LookaheadSet>,
) -> LookaheadSet {
    let mut predict = first_of(&production.rhs, first);
    if predict.remove(&Lookahead::Empty) {
        if let Some(lhs_follow) = follow.get(&production.lhs) {
            predict.extend(lhs_follow.iter().cloned());
        }
    }
    predict
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> LookaheadSet {
        items
            .iter()
            .map(|item| match *item {
                "$" => Lookahead::End,
                "EPSILON" => Lookahead::Empty,
                t => Lookahead::terminal(t),
            })
            .collect()
    }

    fn tone_table() -> ParseTable {
        ParseTable::build(Grammar::tone()).unwrap()
    }

    #[test]
    fn first_sets_of_tone_grammar() {
        let table = tone_table();
        let first = |name: &str| table.get(name).unwrap().first.clone();
        assert_eq!(first("Factor"), set(&["(", "ID", "NUMBER", "STATIC_STRING"]));
        assert_eq!(first("ProgramBody"), set(&["(", "ID", "NUMBER", "STATIC_STRING"]));
        assert_eq!(first("ExprPrime"), set(&["+", "EPSILON"]));
        assert_eq!(first("StartRule"), set(&["*", "+", ";", "="]));
    }

    #[test]
    fn follow_sets_of_tone_grammar() {
        let table = tone_table();
        let follow = |name: &str| table.get(name).unwrap().follow.clone();
        assert_eq!(follow("Program"), set(&["$"]));
        assert_eq!(follow("ProgramBody"), set(&["$"]));
        assert_eq!(follow("Expr"), set(&[")", ";"]));
        assert_eq!(follow("Term"), set(&[")", "+", ";"]));
        assert_eq!(follow("TermPrime"), set(&[")", "+", ";"]));
        assert_eq!(follow("Factor"), set(&[")", "*", "+", ";"]));
    }

    #[test]
    fn empty_alternative_predicts_follow() {
        let table = tone_table();
        let expr_prime = table.get("ExprPrime").unwrap();
        assert_eq!(expr_prime.alternatives[0].predict, set(&["+"]));
        assert_eq!(expr_prime.alternatives[1].predict, set(&[")", ";"]));
    }

    #[test]
    fn tone_grammar_is_ll1() {
        assert!(tone_table().conflicts().is_empty());
    }

    #[test]
    fn tables_are_stable_across_builds() {
        let a = tone_table();
        let b = tone_table();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn steps_follow_right_hand_side() {
        let table = tone_table();
        let program = table.entry(table.start());
        assert_eq!(program.name, "Program");
        // Nonterminals are numbered in declaration order.
        assert_eq!(table.entry(1).name, "ProgramBody");
        assert_eq!(
            program.alternatives[0].steps[0],
            Step::Expand(1)
        );
        assert_eq!(
            program.alternatives[0].steps[1..],
            [Step::Fire(Action::PrintFinalResult), Step::ExpectEnd]
        );
    }

    #[test]
    fn overlapping_alternatives_conflict() {
        let grammar = Grammar::parse("S -> A $\nA -> /a | /a /b").unwrap();
        assert_eq!(
            ParseTable::build(&grammar).unwrap_err(),
            GrammarError::Conflict {
                nonterminal: "A".to_string(),
                lookahead: "a".to_string(),
                first: 0,
                second: 1,
            }
        );
    }

    #[test]
    fn left_recursion_is_caught_as_conflict() {
        let grammar = Grammar::parse("S -> E $\nE -> E /+ /x | /x").unwrap();
        assert!(matches!(
            ParseTable::build(&grammar),
            Err(GrammarError::Conflict { .. })
        ));
    }

    #[test]
    fn nullable_chain_reaches_end_marker() {
        let grammar = Grammar::parse("S -> A B $\nA -> /a | EPSILON\nB -> ActionAdd").unwrap();
        let table = ParseTable::build(&grammar).unwrap();
        assert_eq!(table.get("A").unwrap().follow, set(&["$"]));
        assert_eq!(table.get("B").unwrap().first, set(&["EPSILON"]));
        assert_eq!(table.get("S").unwrap().first, set(&["$", "a"]));
    }

    #[test]
    fn display_lists_every_nonterminal() {
        let dump = tone_table().to_string();
        for name in Grammar::tone().nonterminals() {
            assert!(dump.lines().any(|l| l == name), "missing {name}");
        }
        assert!(dump.contains("PREDICT: {+}  ExprPrime -> /+ Term ActionAdd ExprPrime"));
    }
}
