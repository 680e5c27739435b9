use std::{fmt, io, sync::Arc};

use itertools::Itertools as _;
use thiserror::Error;

use crate::{Lookahead, NonTerminal, Position, Production, Symbol, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoCustomError;

impl fmt::Display for NoCustomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no custom error")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSymbols(Vec<String>);

impl fmt::Display for ExpectedSymbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().join(", ").fmt(f)
    }
}

/// Failures of the buffered rune reader.
///
/// Errors are cached by the reader and reported again on every later read,
/// hence the shared I/O error.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("{0}")]
    Io(Arc<io::Error>),

    #[error("invalid utf-8 character at {position}")]
    InvalidUtf8 { position: usize },

    #[error("the buffer half size must be positive")]
    InvalidBufferSize,

    #[error("lexeme at {position} does not fit in half of the input buffer")]
    LexemeTooLong { position: usize },
}

impl From<io::Error> for InputError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl PartialEq for InputError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Io(a), Self::Io(b)) => Arc::ptr_eq(a, b) || a.kind() == b.kind(),
            (Self::InvalidUtf8 { position: a }, Self::InvalidUtf8 { position: b }) => a == b,
            (Self::InvalidBufferSize, Self::InvalidBufferSize) => true,
            (Self::LexemeTooLong { position: a }, Self::LexemeTooLong { position: b }) => a == b,
            _ => false,
        }
    }
}

/// Violations of the grammar invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("start symbol {0} is not a declared non-terminal")]
    UndeclaredStart(NonTerminal),

    #[error("production {production} has undeclared head")]
    UndeclaredHead { production: Production },

    #[error("production {production} uses undeclared symbol {symbol}")]
    UndeclaredSymbol {
        production: Production,
        symbol: Symbol,
    },

    #[error("production {0} contains the endmarker")]
    EndmarkerInBody(Production),

    #[error("symbol {0} is declared more than once")]
    DuplicatedSymbol(String),

    #[error("symbol {0} is declared both as a terminal and a non-terminal")]
    AmbiguousSymbol(String),

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("start symbol not set")]
    MissingStart,
}

/// More than one production sits in a single parsing table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleProductionsError {
    pub non_terminal: NonTerminal,
    pub lookahead: Lookahead,
    /// Productions in canonical order.
    pub productions: Vec<Production>,
}

impl fmt::Display for MultipleProductionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "multiple productions in parsing table at M[{}, {}]:",
            self.non_terminal, self.lookahead
        )?;

        for production in self.productions.iter() {
            write!(f, "\n  {}", production)?;
        }

        Ok(())
    }
}

impl std::error::Error for MultipleProductionsError {}

/// Every conflicting entry of a parsing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingTableError {
    pub errors: Vec<MultipleProductionsError>,
}

impl ParsingTableError {
    pub fn iter(&self) -> impl Iterator<Item = &MultipleProductionsError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ParsingTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.errors.iter().join("\n").fmt(f)
    }
}

impl std::error::Error for ParsingTableError {}

#[derive(Error, Debug, Clone)]
pub enum ErrorKind<C> {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("cannot use a parsing table with conflicts: {0}")]
    TableConstruction(#[from] ParsingTableError),

    #[error("unexpected terminal {0} on stack")]
    UnexpectedTerminalOnStack(Symbol),

    #[error("unacceptable input <{}, {}> for non-terminal {non_terminal}", .token.terminal, .token.lexeme)]
    UnacceptableInput {
        non_terminal: NonTerminal,
        token: Token,
    },

    #[error("unexpected input <{}, {}> after the end of the parse", .0.terminal, .0.lexeme)]
    TrailingInput(Token),

    #[error("unexpected symbol {got}, expecting {expecting}")]
    UnexpectedSymbol {
        expecting: ExpectedSymbols,
        got: String,
    },

    #[error("{0}")]
    Other(C),
}

impl<C> ErrorKind<C> {
    pub fn unexpected_symbol<I, S>(got: &str, expecting: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self::UnexpectedSymbol {
            expecting: ExpectedSymbols(expecting.into_iter().map(|s| s.to_string()).collect()),
            got: got.to_string(),
        }
    }
}

/// An error raised while lexing or parsing, with the position it refers to.
#[derive(Debug, Clone)]
pub struct PredictiveError<C> {
    /// Kind of error
    kind: ErrorKind<C>,
    /// Location of the error in a stream.
    pub(crate) position: Option<Position>,
}

impl<C> PredictiveError<C> {
    pub fn new(kind: impl Into<ErrorKind<C>>, position: Option<Position>) -> Self {
        Self {
            kind: kind.into(),
            position,
        }
    }

    pub fn kind(&self) -> &ErrorKind<C> {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind<C> {
        self.kind
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }
}

impl<C> From<ErrorKind<C>> for PredictiveError<C> {
    fn from(kind: ErrorKind<C>) -> Self {
        Self {
            kind,
            position: None,
        }
    }
}

impl<C> From<InputError> for PredictiveError<C> {
    fn from(err: InputError) -> Self {
        Self {
            kind: ErrorKind::Input(err),
            position: None,
        }
    }
}

impl<C> From<ParsingTableError> for PredictiveError<C> {
    fn from(err: ParsingTableError) -> Self {
        Self {
            kind: ErrorKind::TableConstruction(err),
            position: None,
        }
    }
}

impl<C: fmt::Display> fmt::Display for PredictiveError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {}", position, self.kind),
            None => self.kind.fmt(f),
        }
    }
}

impl<C> std::error::Error for PredictiveError<C>
where
    C: fmt::Debug + fmt::Display + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Input(err) => Some(err),
            ErrorKind::TableConstruction(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ErrorKind, InputError, MultipleProductionsError, NoCustomError, ParsingTableError,
        PredictiveError,
    };
    use crate::{Lookahead, NonTerminal, Position, Production, Symbol, Terminal, Token};

    #[test]
    fn test_multiple_productions_message() {
        let err = MultipleProductionsError {
            non_terminal: NonTerminal::new("E"),
            lookahead: Lookahead::term("id"),
            productions: vec![
                Production::new(
                    NonTerminal::new("E"),
                    [Symbol::nterm("E"), Symbol::term("+"), Symbol::nterm("T")],
                ),
                Production::new(NonTerminal::new("E"), [Symbol::nterm("T")]),
            ],
        };

        assert_eq!(
            err.to_string(),
            "multiple productions in parsing table at M[E, \"id\"]:\n  E → E \"+\" T\n  E → T"
        );

        let all = ParsingTableError {
            errors: vec![err.clone(), err],
        };
        assert_eq!(all.to_string().lines().count(), 6);
    }

    #[test]
    fn test_unacceptable_input_message() {
        let token = Token::new(Terminal::new("+"), "+", Position::new("calc", 4, 1, 5));
        let err = PredictiveError::<NoCustomError>::new(
            ErrorKind::UnacceptableInput {
                non_terminal: NonTerminal::new("F"),
                token: token.clone(),
            },
            Some(token.position.clone()),
        );

        assert_eq!(
            err.to_string(),
            "calc:1:5: unacceptable input <\"+\", +> for non-terminal F"
        );
    }

    #[test]
    fn test_unacceptable_input_without_line() {
        let token = Token::new(Terminal::new("id"), "x", Position::new("calc", 4, 0, 0));
        let err = PredictiveError::<NoCustomError>::new(
            ErrorKind::UnacceptableInput {
                non_terminal: NonTerminal::new("E'"),
                token: token.clone(),
            },
            Some(token.position),
        );

        assert_eq!(
            err.to_string(),
            "calc:4: unacceptable input <\"id\", x> for non-terminal E'"
        );
    }

    #[test]
    fn test_invalid_utf8_message() {
        let err = InputError::InvalidUtf8 { position: 3 };
        assert_eq!(err.to_string(), "invalid utf-8 character at 3");

        let err = PredictiveError::<NoCustomError>::from(err);
        assert_eq!(err.position(), None);
        assert_eq!(err.to_string(), "invalid utf-8 character at 3");
    }
}
