use itertools::Itertools;

use crate::{NonTerminal, Symbol, EPSILON};

/// A grammar production
///
/// # Example
/// E' → "+" T E'
///
/// An empty body is an ε-production.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Production {
    pub head: NonTerminal,
    pub body: Vec<Symbol>,
}

impl Production {
    pub fn new(head: NonTerminal, body: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            head,
            body: body.into_iter().collect(),
        }
    }

    /// Creates an ε-production.
    pub fn empty(head: NonTerminal) -> Self {
        Self { head, body: vec![] }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Check the production contains a certain symbol in its body.
    #[inline(always)]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.body.contains(symbol)
    }
}

impl std::fmt::Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.body.is_empty() {
            write!(f, "{} → {}", self.head, EPSILON)
        } else {
            write!(f, "{} → {}", self.head, self.body.iter().join(" "))
        }
    }
}
