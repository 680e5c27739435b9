use std::collections::HashSet;

use crate::{GrammarError, NonTerminal, Production, Symbol, Terminal};

/// A context-free grammar.
///
/// Terminals and non-terminals keep their declaration order, which is the
/// order used to render parsing tables.
///
/// # Example
///
/// For the following grammar :
///
/// ```grammar
/// E  → T E'
/// E' → "+" T E' | ε
/// T  → "id"
/// ```
///
/// ```
/// use predictive_core::grammar;
///
/// let grammar = grammar! {
///     terminals: ["+", "id"],
///     non_terminals: ["E", "E'", "T"],
///     start: "E",
///     rules: {
///         "E" => "T" "E'";
///         "E'" => "+" "T" "E'";
///         "E'" => ;
///         "T" => "id";
///     }
/// }
/// .unwrap();
///
/// assert_eq!(grammar.productions().count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    terminals: Vec<Terminal>,
    non_terminals: Vec<NonTerminal>,
    productions: Vec<Production>,
    start: NonTerminal,
}

impl Grammar {
    /// Creates a grammar without checking it, see [`Grammar::verify`].
    ///
    /// Duplicated productions are dropped.
    pub fn new(
        terminals: impl IntoIterator<Item = Terminal>,
        non_terminals: impl IntoIterator<Item = NonTerminal>,
        productions: impl IntoIterator<Item = Production>,
        start: NonTerminal,
    ) -> Self {
        let mut seen = HashSet::new();

        Self {
            terminals: terminals.into_iter().collect(),
            non_terminals: non_terminals.into_iter().collect(),
            productions: productions
                .into_iter()
                .filter(|p| seen.insert(p.clone()))
                .collect(),
            start,
        }
    }

    /// Creates a new [`GrammarBuilder`].
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    /// Checks that every body symbol is declared, every head is a declared
    /// non-terminal, and the start symbol is declared.
    pub fn verify(&self) -> Result<(), GrammarError> {
        let mut names = HashSet::new();
        for name in self
            .terminals
            .iter()
            .map(Terminal::name)
            .chain(self.non_terminals.iter().map(NonTerminal::name))
        {
            if !names.insert(name) {
                return Err(if self.is_terminal_name(name) && self.is_non_terminal_name(name) {
                    GrammarError::AmbiguousSymbol(name.to_string())
                } else {
                    GrammarError::DuplicatedSymbol(name.to_string())
                });
            }
        }

        if !self.non_terminals.contains(&self.start) {
            return Err(GrammarError::UndeclaredStart(self.start.clone()));
        }

        for production in self.productions.iter() {
            if !self.non_terminals.contains(&production.head) {
                return Err(GrammarError::UndeclaredHead {
                    production: production.clone(),
                });
            }

            for symbol in production.body.iter() {
                let declared = match symbol {
                    Symbol::Terminal(t) => self.terminals.contains(t),
                    Symbol::NonTerminal(n) => self.non_terminals.contains(n),
                    Symbol::Endmarker => {
                        return Err(GrammarError::EndmarkerInBody(production.clone()))
                    }
                };

                if !declared {
                    return Err(GrammarError::UndeclaredSymbol {
                        production: production.clone(),
                        symbol: symbol.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn is_terminal_name(&self, name: &str) -> bool {
        self.terminals.iter().any(|t| t.name() == name)
    }

    fn is_non_terminal_name(&self, name: &str) -> bool {
        self.non_terminals.iter().any(|n| n.name() == name)
    }

    pub fn start(&self) -> &NonTerminal {
        &self.start
    }

    /// Terminals in declaration order.
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    /// Non-terminals in declaration order.
    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    /// Iterate over all productions of the grammar
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter()
    }

    /// Iterate over the productions whose head is `head`.
    pub fn productions_of<'a>(
        &'a self,
        head: &'a NonTerminal,
    ) -> impl Iterator<Item = &'a Production> + 'a {
        self.productions.iter().filter(move |p| &p.head == head)
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for production in self.productions.iter() {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

/// Builder struct for the [`Grammar`].
///
/// Rule bodies are given by name and resolved against the declared symbols
/// when building.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    terminals: Vec<String>,
    non_terminals: Vec<String>,
    rules: Vec<(String, Vec<String>)>,
    start: Option<String>,
}

impl GrammarBuilder {
    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.terminals.push(name.into());
        self
    }

    pub fn terminals<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.terminals.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn non_terminal(mut self, name: impl Into<String>) -> Self {
        self.non_terminals.push(name.into());
        self
    }

    pub fn non_terminals<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.non_terminals.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the start symbol of the [`Grammar`].
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Adds the production `head → body`; an empty body is an ε-production.
    pub fn rule(mut self, head: impl Into<String>, body: &[&str]) -> Self {
        self.rules
            .push((head.into(), body.iter().map(|s| s.to_string()).collect()));
        self
    }

    /// Builds the [`Grammar`] and verifies it.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let start = self.start.ok_or(GrammarError::MissingStart)?;

        let resolve = |name: &str| -> Result<Symbol, GrammarError> {
            let is_terminal = self.terminals.iter().any(|t| t == name);
            let is_non_terminal = self.non_terminals.iter().any(|n| n == name);

            match (is_terminal, is_non_terminal) {
                (true, true) => Err(GrammarError::AmbiguousSymbol(name.to_string())),
                (true, false) => Ok(Symbol::term(name)),
                (false, true) => Ok(Symbol::nterm(name)),
                (false, false) => Err(GrammarError::UnknownSymbol(name.to_string())),
            }
        };

        let productions = self
            .rules
            .iter()
            .map(|(head, body)| {
                Ok(Production::new(
                    NonTerminal::new(head.as_str()),
                    body.iter()
                        .map(|name| resolve(name.as_str()))
                        .collect::<Result<Vec<_>, _>>()?,
                ))
            })
            .collect::<Result<Vec<_>, GrammarError>>()?;

        let grammar = Grammar::new(
            self.terminals.iter().map(|t| Terminal::new(t.as_str())),
            self.non_terminals.iter().map(|n| NonTerminal::new(n.as_str())),
            productions,
            NonTerminal::new(start),
        );

        grammar.verify()?;
        Ok(grammar)
    }
}

/// Declares a [`Grammar`] and builds it.
///
/// Evaluates to `Result<Grammar, GrammarError>`.
#[macro_export]
macro_rules! grammar {
    (
        terminals: [$($t:literal),* $(,)?],
        non_terminals: [$($n:literal),* $(,)?],
        start: $s:literal,
        rules: { $($head:literal => $($sym:literal)*;)* } $(,)?
    ) => {
        $crate::Grammar::builder()
            $(.terminal($t))*
            $(.non_terminal($n))*
            .start($s)
            $(.rule($head, &[$($sym),*]))*
            .build()
    };
}
