//! FIRST and FOLLOW sets.
//!
//! Both are least fixed points, computed by sweeping the productions until
//! no set grows.
use std::collections::{BTreeSet, HashMap};

use itertools::Itertools as _;
use tracing::debug;

use crate::{Grammar, NonTerminal, Symbol, Terminal, EPSILON};

/// FIRST(α): the terminals that can begin a string derived from α, and
/// whether α derives ε.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<Terminal>,
    pub includes_empty: bool,
}

/// FOLLOW(A): the terminals that can appear right after A in a sentential
/// form, and whether A can end one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSet {
    pub terminals: BTreeSet<Terminal>,
    pub includes_endmarker: bool,
}

impl FirstSet {
    pub fn new<I: IntoIterator<Item = Terminal>>(terminals: I, includes_empty: bool) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
            includes_empty,
        }
    }

    /// The FIRST set of the empty string.
    pub fn empty() -> Self {
        Self {
            terminals: BTreeSet::new(),
            includes_empty: true,
        }
    }

    /// Adds `other` into `self`; returns true if `self` grew.
    fn merge(&mut self, other: &FirstSet) -> bool {
        let len = self.terminals.len();
        self.terminals.extend(other.terminals.iter().cloned());

        let grew_empty = other.includes_empty && !self.includes_empty;
        self.includes_empty |= other.includes_empty;

        grew_empty || len != self.terminals.len()
    }
}

impl FollowSet {
    pub fn new<I: IntoIterator<Item = Terminal>>(terminals: I, includes_endmarker: bool) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
            includes_endmarker,
        }
    }

    fn merge(&mut self, other: &FollowSet) -> bool {
        let len = self.terminals.len();
        self.terminals.extend(other.terminals.iter().cloned());

        let grew_endmarker = other.includes_endmarker && !self.includes_endmarker;
        self.includes_endmarker |= other.includes_endmarker;

        grew_endmarker || len != self.terminals.len()
    }

    fn merge_terminals<'a>(&mut self, terminals: impl Iterator<Item = &'a Terminal>) -> bool {
        let len = self.terminals.len();
        self.terminals.extend(terminals.cloned());
        len != self.terminals.len()
    }
}

impl std::fmt::Display for FirstSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let empty = self.includes_empty.then_some(EPSILON.to_string());
        write!(
            f,
            "{{{}}}",
            self.terminals.iter().map(ToString::to_string).chain(empty).join(", ")
        )
    }
}

impl std::fmt::Display for FollowSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endmarker = self.includes_endmarker.then_some(crate::ENDMARKER.to_string());
        write!(
            f,
            "{{{}}}",
            self.terminals.iter().map(ToString::to_string).chain(endmarker).join(", ")
        )
    }
}

/// FIRST sets of every non-terminal of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets(HashMap<NonTerminal, FirstSet>);

impl FirstSets {
    fn compute(grammar: &Grammar) -> Self {
        let mut sets = Self(
            grammar
                .non_terminals()
                .iter()
                .map(|n| (n.clone(), FirstSet::default()))
                .collect(),
        );

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut changed = false;

            for production in grammar.productions() {
                let first = sets.of_string(&production.body);
                changed |= sets
                    .0
                    .entry(production.head.clone())
                    .or_default()
                    .merge(&first);
            }

            if !changed {
                break;
            }
        }

        debug!(sweeps, non_terminals = sets.0.len(), "computed FIRST sets");
        sets
    }

    /// FIRST of a non-terminal.
    pub fn get(&self, non_terminal: &NonTerminal) -> Option<&FirstSet> {
        self.0.get(non_terminal)
    }

    /// FIRST of a single symbol.
    ///
    /// A terminal `a` yields `({a}, false)`. The endmarker never starts a
    /// derivation and yields `(∅, false)`.
    pub fn of_symbol(&self, symbol: &Symbol) -> FirstSet {
        match symbol {
            Symbol::Terminal(t) => FirstSet::new([t.clone()], false),
            Symbol::NonTerminal(n) => self.0.get(n).cloned().unwrap_or_default(),
            Symbol::Endmarker => FirstSet::default(),
        }
    }

    /// FIRST of a string of symbols; the empty string yields `(∅, true)`.
    pub fn of_string(&self, symbols: &[Symbol]) -> FirstSet {
        let mut result = FirstSet::default();

        for symbol in symbols {
            let first = self.of_symbol(symbol);
            result.terminals.extend(first.terminals);

            if !first.includes_empty {
                return result;
            }
        }

        result.includes_empty = true;
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NonTerminal, &FirstSet)> {
        self.0.iter()
    }
}

/// FOLLOW sets of every non-terminal of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSets(HashMap<NonTerminal, FollowSet>);

impl FollowSets {
    fn compute(grammar: &Grammar, first: &FirstSets) -> Self {
        let mut sets: HashMap<NonTerminal, FollowSet> = grammar
            .non_terminals()
            .iter()
            .map(|n| (n.clone(), FollowSet::default()))
            .collect();

        sets.entry(grammar.start().clone())
            .or_default()
            .includes_endmarker = true;

        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut changed = false;

            for production in grammar.productions() {
                for (i, symbol) in production.body.iter().enumerate() {
                    let Symbol::NonTerminal(a) = symbol else {
                        continue;
                    };

                    // B → α A β
                    let beta = first.of_string(&production.body[i + 1..]);
                    changed |= sets
                        .entry(a.clone())
                        .or_default()
                        .merge_terminals(beta.terminals.iter());

                    if beta.includes_empty {
                        let follow_head = sets.get(&production.head).cloned().unwrap_or_default();
                        changed |= sets.entry(a.clone()).or_default().merge(&follow_head);
                    }
                }
            }

            if !changed {
                break;
            }
        }

        debug!(sweeps, non_terminals = sets.len(), "computed FOLLOW sets");
        Self(sets)
    }

    pub fn get(&self, non_terminal: &NonTerminal) -> Option<&FollowSet> {
        self.0.get(non_terminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NonTerminal, &FollowSet)> {
        self.0.iter()
    }
}

impl Grammar {
    /// Computes FIRST for every non-terminal.
    pub fn first_sets(&self) -> FirstSets {
        FirstSets::compute(self)
    }

    /// Computes FOLLOW for every non-terminal.
    pub fn follow_sets(&self, first: &FirstSets) -> FollowSets {
        FollowSets::compute(self, first)
    }

    /// FIRST of a string of symbols.
    pub fn first(&self, symbols: &[Symbol]) -> FirstSet {
        self.first_sets().of_string(symbols)
    }

    /// FOLLOW of a non-terminal.
    pub fn follow(&self, non_terminal: &NonTerminal) -> FollowSet {
        let first = self.first_sets();
        self.follow_sets(&first)
            .get(non_terminal)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{FirstSet, FollowSet};
    use crate::{
        grammar::fixtures::{epsilon_follow_grammar, expression_grammar},
        NonTerminal, Symbol, Terminal,
    };

    fn terms(names: &[&str]) -> Vec<Terminal> {
        names.iter().map(|n| Terminal::new(*n)).collect()
    }

    #[test]
    fn test_first_of_expression_grammar() {
        let grammar = expression_grammar();
        let first = grammar.first_sets();

        let cases = [
            ("E", FirstSet::new(terms(&["(", "id"]), false)),
            ("E'", FirstSet::new(terms(&["+"]), true)),
            ("T", FirstSet::new(terms(&["(", "id"]), false)),
            ("T'", FirstSet::new(terms(&["*"]), true)),
            ("F", FirstSet::new(terms(&["(", "id"]), false)),
        ];

        for (name, expected) in cases {
            assert_eq!(first.get(&NonTerminal::new(name)), Some(&expected), "FIRST({name})");
        }
    }

    #[test]
    fn test_follow_of_expression_grammar() {
        let grammar = expression_grammar();
        let first = grammar.first_sets();
        let follow = grammar.follow_sets(&first);

        let cases = [
            ("E", FollowSet::new(terms(&[")"]), true)),
            ("E'", FollowSet::new(terms(&[")"]), true)),
            ("T", FollowSet::new(terms(&["+", ")"]), true)),
            ("T'", FollowSet::new(terms(&["+", ")"]), true)),
            ("F", FollowSet::new(terms(&["+", "*", ")"]), true)),
        ];

        for (name, expected) in cases {
            assert_eq!(follow.get(&NonTerminal::new(name)), Some(&expected), "FOLLOW({name})");
        }
    }

    #[test]
    fn test_first_of_string() {
        let grammar = expression_grammar();

        assert_eq!(grammar.first(&[]), FirstSet::empty());
        assert_eq!(
            grammar.first(&[Symbol::nterm("E'"), Symbol::nterm("T'")]),
            FirstSet::new(terms(&["+", "*"]), true)
        );
        assert_eq!(
            grammar.first(&[Symbol::nterm("T'"), Symbol::term(")"), Symbol::nterm("E")]),
            FirstSet::new(terms(&["*", ")"]), false)
        );
        assert_eq!(
            grammar.first(&[Symbol::term("id"), Symbol::nterm("E'")]),
            FirstSet::new(terms(&["id"]), false)
        );
    }

    #[test]
    fn test_epsilon_follow() {
        let grammar = epsilon_follow_grammar();

        assert_eq!(
            grammar.first(&[Symbol::nterm("A")]),
            FirstSet::new(terms(&["a"]), true)
        );
        assert_eq!(
            grammar.follow(&NonTerminal::new("A")),
            FollowSet::new(terms(&["b"]), false)
        );
        assert_eq!(
            grammar.follow(&NonTerminal::new("S")),
            FollowSet::new(terms(&[]), true)
        );
    }

    #[test]
    fn test_nullable_chain() {
        // S → A B c | A B, A → ε | a, B → A
        let grammar = crate::grammar! {
            terminals: ["a", "c"],
            non_terminals: ["S", "A", "B"],
            start: "S",
            rules: {
                "S" => "A" "B" "c";
                "S" => "A" "B";
                "A" => ;
                "A" => "a";
                "B" => "A";
            }
        }
        .unwrap();

        let first = grammar.first_sets();
        assert_eq!(
            first.get(&NonTerminal::new("S")),
            Some(&FirstSet::new(terms(&["a", "c"]), true))
        );
        assert_eq!(
            first.get(&NonTerminal::new("B")),
            Some(&FirstSet::new(terms(&["a"]), true))
        );

        let follow = grammar.follow_sets(&first);
        assert_eq!(
            follow.get(&NonTerminal::new("A")),
            Some(&FollowSet::new(terms(&["a", "c"]), true))
        );
        assert_eq!(
            follow.get(&NonTerminal::new("B")),
            Some(&FollowSet::new(terms(&["c"]), true))
        );
    }

    #[test]
    fn test_first_is_within_terminals() {
        let grammar = expression_grammar();
        let first = grammar.first_sets();

        for (_, set) in first.iter() {
            assert!(set.terminals.iter().all(|t| grammar.terminals().contains(t)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FirstSet::new(terms(&["a"]), true).to_string(), "{\"a\", ε}");
        assert_eq!(FollowSet::new(terms(&["b"]), true).to_string(), "{\"b\", $}");
        assert_eq!(FollowSet::default().to_string(), "{}");
    }
}
