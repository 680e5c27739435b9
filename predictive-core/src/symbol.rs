use std::fmt;

/// Literal used to render the endmarker.
pub const ENDMARKER: &str = "$";

/// Literal used to render an empty production body.
pub const EPSILON: &str = "ε";

/// A terminal symbol, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Terminal(String);

/// A non-terminal symbol, identified by its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonTerminal(String);

impl Terminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl NonTerminal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Terminal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&str> for NonTerminal {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Defines a grammar symbol.
///
/// The empty string ε is not a symbol; it is an empty production body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
    /// The synthetic `$` terminal marking the end of the input.
    Endmarker,
}

impl Symbol {
    pub fn term(name: impl Into<String>) -> Self {
        Self::Terminal(Terminal::new(name))
    }

    pub fn nterm(name: impl Into<String>) -> Self {
        Self::NonTerminal(NonTerminal::new(name))
    }

    /// True for terminals and the endmarker.
    #[inline(always)]
    pub fn is_terminal(&self) -> bool {
        !self.is_non_terminal()
    }

    #[inline(always)]
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Self::NonTerminal(_))
    }

    #[inline(always)]
    pub fn is_endmarker(&self) -> bool {
        matches!(self, Self::Endmarker)
    }

    /// The lookahead this symbol matches, if it is a terminal or the endmarker.
    pub fn as_lookahead(&self) -> Option<Lookahead> {
        match self {
            Self::Terminal(t) => Some(Lookahead::Terminal(t.clone())),
            Self::Endmarker => Some(Lookahead::Endmarker),
            Self::NonTerminal(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => t.fmt(f),
            Self::NonTerminal(n) => n.fmt(f),
            Self::Endmarker => f.write_str(ENDMARKER),
        }
    }
}

impl From<Terminal> for Symbol {
    fn from(value: Terminal) -> Self {
        Self::Terminal(value)
    }
}

impl From<NonTerminal> for Symbol {
    fn from(value: NonTerminal) -> Self {
        Self::NonTerminal(value)
    }
}

/// What a token can be: a terminal or the endmarker.
///
/// This is also the column index of a parsing table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lookahead {
    Terminal(Terminal),
    Endmarker,
}

impl Lookahead {
    pub fn term(name: impl Into<String>) -> Self {
        Self::Terminal(Terminal::new(name))
    }

    #[inline(always)]
    pub fn is_endmarker(&self) -> bool {
        matches!(self, Self::Endmarker)
    }

    /// Returns true if the stack symbol matches this lookahead.
    pub fn matches(&self, symbol: &Symbol) -> bool {
        match (self, symbol) {
            (Self::Terminal(a), Symbol::Terminal(b)) => a == b,
            (Self::Endmarker, Symbol::Endmarker) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => t.fmt(f),
            Self::Endmarker => f.write_str(ENDMARKER),
        }
    }
}

impl From<Terminal> for Lookahead {
    fn from(value: Terminal) -> Self {
        Self::Terminal(value)
    }
}

impl From<Lookahead> for Symbol {
    fn from(value: Lookahead) -> Self {
        match value {
            Lookahead::Terminal(t) => Self::Terminal(t),
            Lookahead::Endmarker => Self::Endmarker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lookahead, Symbol};

    #[test]
    fn test_display() {
        assert_eq!(Symbol::term("id").to_string(), "\"id\"");
        assert_eq!(Symbol::nterm("E'").to_string(), "E'");
        assert_eq!(Symbol::Endmarker.to_string(), "$");
        assert_eq!(Lookahead::term("+").to_string(), "\"+\"");
    }

    #[test]
    fn test_lookahead_matches() {
        assert!(Lookahead::term("id").matches(&Symbol::term("id")));
        assert!(Lookahead::Endmarker.matches(&Symbol::Endmarker));
        assert!(!Lookahead::term("id").matches(&Symbol::nterm("id")));
        assert!(!Lookahead::Endmarker.matches(&Symbol::term("$")));
    }
}
