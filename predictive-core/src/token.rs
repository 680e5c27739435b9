use crate::{Lookahead, Position, Terminal};

/// A lexed token: the terminal it stands for, the matched text and where it
/// starts.
///
/// The endmarker token is synthesized by the parser when the lexer is
/// exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub terminal: Lookahead,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new<S>(terminal: Terminal, lexeme: S, position: Position) -> Self
    where
        S: ToString,
    {
        Self {
            terminal: Lookahead::Terminal(terminal),
            lexeme: lexeme.to_string(),
            position,
        }
    }

    /// The end-of-input token: `$` with an empty lexeme.
    pub fn endmarker(position: Position) -> Self {
        Self {
            terminal: Lookahead::Endmarker,
            lexeme: String::new(),
            position,
        }
    }

    #[inline(always)]
    pub fn is_endmarker(&self) -> bool {
        self.terminal.is_endmarker()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}, {}>", self.terminal, self.lexeme, self.position)
    }
}
