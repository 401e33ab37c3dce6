//! Derivation tree recorded while parsing.

use std::fmt;

/// A node of the derivation: a nonterminal, a consumed token, `epsilon` or `$`.
///
/// Long programs nest deeply through the right-recursive statement and
/// operator rules, so traversal, comparison and drop use explicit stacks.
#[derive(Debug, Clone, Eq, Default)]
pub struct ParseTree {
    pub label: String,
    pub children: Vec<ParseTree>,
}

impl ParseTree {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Depth-first search for the first node with this label.
    pub fn find(&self, label: &str) -> Option<&ParseTree> {
        self.preorder().map(|(node, _)| node).find(|node| node.label == label)
    }

    /// Labels of the leaves, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        self.preorder()
            .filter(|(node, _)| node.children.is_empty())
            .map(|(node, _)| node.label.as_str())
            .collect()
    }

    /// Nodes in pre-order, paired with their depth.
    fn preorder(&self) -> impl Iterator<Item = (&ParseTree, usize)> {
        let mut stack = vec![(self, 0)];
        std::iter::from_fn(move || {
            let (node, depth) = stack.pop()?;
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
            Some((node, depth))
        })
    }
}

impl PartialEq for ParseTree {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some((a, b)) = pairs.pop() {
            if a.label != b.label || a.children.len() != b.children.len() {
                return false;
            }
            pairs.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Drop for ParseTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, depth) in self.preorder() {
            writeln!(f, "{:indent$}{}", "", node.label, indent = depth * 2)?;
        }
        Ok(())
    }
}

/// Builds the tree as the parser descends and returns.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    open: Vec<ParseTree>,
    root: Option<ParseTree>,
}

impl TreeBuilder {
    pub(crate) fn open(&mut self, label: impl Into<String>) {
        self.open.push(ParseTree::new(label));
    }

    pub(crate) fn close(&mut self) {
        let Some(node) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
    }

    pub(crate) fn leaf(&mut self, label: impl Into<String>) {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(ParseTree::new(label));
        }
    }

    pub(crate) fn finish(mut self) -> Option<ParseTree> {
        while !self.open.is_empty() {
            self.close();
        }
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseTree {
        let mut builder = TreeBuilder::default();
        builder.open("Expr");
        builder.open("Term");
        builder.leaf("(NUMBER, 3)");
        builder.close();
        builder.open("ExprPrime");
        builder.leaf("epsilon");
        builder.close();
        builder.close();
        builder.finish().unwrap()
    }

    #[test]
    fn builder_nests_nodes() {
        let tree = sample();
        assert_eq!(tree.label, "Expr");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.leaves(), vec!["(NUMBER, 3)", "epsilon"]);
    }

    #[test]
    fn find_searches_depth_first() {
        let tree = sample();
        assert_eq!(tree.find("ExprPrime").map(|n| n.children.len()), Some(1));
        assert!(tree.find("Factor").is_none());
    }

    #[test]
    fn finish_closes_open_nodes() {
        let mut builder = TreeBuilder::default();
        builder.open("Program");
        builder.open("ProgramBody");
        builder.leaf("(ID, x)");
        let tree = builder.finish().unwrap();
        assert_eq!(tree.leaves(), vec!["(ID, x)"]);
    }

    #[test]
    fn display_indents_children() {
        let rendered = sample().to_string();
        assert_eq!(
            rendered,
            "Expr\n  Term\n    (NUMBER, 3)\n  ExprPrime\n    epsilon\n"
        );
    }

    #[test]
    fn deep_chain_compares_and_drops() {
        let chain = |depth: usize| {
            let mut builder = TreeBuilder::default();
            for _ in 0..depth {
                builder.open("ProgramRest");
            }
            builder.leaf("epsilon");
            builder.finish().unwrap()
        };
        let a = chain(200_000);
        let b = chain(200_000);
        assert_eq!(a, b);
        assert_eq!(a.leaves(), vec!["epsilon"]);
        assert_ne!(a, chain(199_999));
    }
}
