use std::{io::Read, marker::PhantomData};

use tracing::trace;

use crate::{
    input::Input, ErrorKind, NextColumn, NextLine, NoCustomError, Position, PredictiveError,
    PredictiveResult, Terminal, Token,
};

const OPERATORS: [char; 6] = ['+', '-', '*', '/', '(', ')'];

/// Terminal of integer literals.
pub const NUM: &str = "num";
/// Terminal of identifiers.
pub const ID: &str = "id";

/// Lexer of arithmetic expressions.
///
/// Produces single character operators (`+ - * / ( )`), `num` for runs of
/// digits and `id` for runs of lowercase letters. Whitespace separates
/// tokens. Lexing stops at the first error.
pub struct ArithmeticLexer<R, Error = NoCustomError> {
    input: Input<R>,
    cursor: Position,
    done: bool,
    _phantom: PhantomData<Error>,
}

impl<R, Error> ArithmeticLexer<R, Error> {
    pub fn new(input: Input<R>) -> Self {
        Self {
            input,
            cursor: Position::new("", 0, 1, 1),
            done: false,
            _phantom: PhantomData,
        }
    }

    /// Name of the source, carried by token positions.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.cursor.filename = filename.into();
        self
    }

    /// Position of the next rune to read.
    pub fn position(&self) -> &Position {
        &self.cursor
    }
}

impl<R: Read, Error> ArithmeticLexer<R, Error> {
    fn scan(&mut self) -> PredictiveResult<Option<Token>, Error> {
        loop {
            let Some(ch) = self.input.next()? else {
                return Ok(None);
            };

            match ch {
                '\n' => {
                    self.input.skip();
                    self.cursor += NextLine;
                }
                ch if ch.is_whitespace() => {
                    self.input.skip();
                    self.cursor += NextColumn;
                }
                ch if OPERATORS.contains(&ch) => return Ok(Some(self.emit(&ch.to_string()))),
                '0'..='9' => {
                    self.consume_while(|ch| ch.is_ascii_digit())?;
                    return Ok(Some(self.emit(NUM)));
                }
                'a'..='z' => {
                    self.consume_while(|ch| ch.is_ascii_lowercase())?;
                    return Ok(Some(self.emit(ID)));
                }
                ch => {
                    self.input.skip();
                    return Err(PredictiveError::new(
                        ErrorKind::unexpected_symbol(
                            &ch.to_string(),
                            OPERATORS
                                .iter()
                                .map(char::to_string)
                                .chain(["digit".to_string(), "letter".to_string()]),
                        ),
                        Some(self.cursor.clone()),
                    ));
                }
            }
        }
    }

    /// Reads runes while `accept` holds, leaving the first rejected one
    /// unread.
    fn consume_while(&mut self, accept: impl Fn(char) -> bool) -> PredictiveResult<(), Error> {
        while let Some(ch) = self.input.next()? {
            if !accept(ch) {
                self.input.retract();
                break;
            }
        }

        Ok(())
    }

    fn emit(&mut self, terminal: &str) -> Token {
        let (lexeme, _) = self.input.lexeme();
        let position = self.cursor.clone();

        for _ in lexeme.chars() {
            self.cursor += NextColumn;
        }

        trace!(terminal, %lexeme, %position, "token");
        Token::new(Terminal::new(terminal), lexeme, position)
    }
}

impl<R: Read, Error> Iterator for ArithmeticLexer<R, Error> {
    type Item = PredictiveResult<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::ArithmeticLexer;
    use crate::{
        input::{fixtures::ChunkedReader, Input},
        ErrorKind, InputError, NoCustomError, Position, PredictiveResult, Token,
    };

    fn lex(source: &str, half_size: usize) -> Vec<PredictiveResult<Token, NoCustomError>> {
        let input = Input::new(Cursor::new(source.as_bytes().to_vec()), half_size).unwrap();
        ArithmeticLexer::new(input).with_filename("calc").collect()
    }

    fn pairs(source: &str) -> Vec<(String, String)> {
        lex(source, 16)
            .into_iter()
            .map(|token| {
                let token = token.unwrap();
                (token.terminal.to_string(), token.lexeme)
            })
            .collect()
    }

    fn pair(terminal: &str, lexeme: &str) -> (String, String) {
        (format!("\"{terminal}\""), lexeme.to_string())
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            pairs("id + id"),
            vec![pair("id", "id"), pair("+", "+"), pair("id", "id")]
        );

        assert_eq!(
            pairs("(42*x)-y/7"),
            vec![
                pair("(", "("),
                pair("num", "42"),
                pair("*", "*"),
                pair("id", "x"),
                pair(")", ")"),
                pair("-", "-"),
                pair("id", "y"),
                pair("/", "/"),
                pair("num", "7"),
            ]
        );
    }

    #[test]
    fn test_flush_at_end_of_input() {
        assert_eq!(pairs("abc"), vec![pair("id", "abc")]);
        assert_eq!(pairs("  123"), vec![pair("num", "123")]);
        assert_eq!(pairs("12ab"), vec![pair("num", "12"), pair("id", "ab")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(lex("", 4).is_empty());
        assert!(lex(" \n\t ", 4).is_empty());
    }

    #[test]
    fn test_positions() {
        let tokens = lex("x +\n  42", 4)
            .into_iter()
            .map(Result::unwrap)
            .collect::<Vec<_>>();

        assert_eq!(tokens[0].position, Position::new("calc", 0, 1, 1));
        assert_eq!(tokens[1].position, Position::new("calc", 2, 1, 3));
        assert_eq!(tokens[2].position, Position::new("calc", 6, 2, 3));
        assert_eq!(tokens[2].lexeme, "42");
    }

    #[test]
    fn test_small_buffer() {
        let source = "ab + cd * (ef - gh)";
        let input = Input::new(
            ChunkedReader {
                data: source.as_bytes(),
                chunk: 3,
            },
            4,
        )
        .unwrap();
        let lexemes = ArithmeticLexer::<_, NoCustomError>::new(input)
            .map(|token| token.unwrap().lexeme)
            .collect::<Vec<_>>();

        assert_eq!(
            lexemes,
            vec!["ab", "+", "cd", "*", "(", "ef", "-", "gh", ")"]
        );
    }

    #[test]
    fn test_lexeme_bounded_by_half_size() {
        assert_eq!(
            lex("ab abcd + y", 4)
                .into_iter()
                .map(|token| token.unwrap().lexeme)
                .collect::<Vec<_>>(),
            vec!["ab", "abcd", "+", "y"]
        );

        let tokens = lex("abcdefghij + x", 4);
        assert_eq!(tokens.len(), 1);
        assert!(matches!(
            tokens[0].as_ref().unwrap_err().kind(),
            ErrorKind::Input(InputError::LexemeTooLong { position: 0 })
        ));
    }

    #[test]
    fn test_unexpected_symbol() {
        let tokens = lex("3 % 4", 4);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].as_ref().unwrap().lexeme, "3");

        let err = tokens[1].as_ref().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedSymbol { got, .. } if got == "%"));
        assert_eq!(err.position(), Some(&Position::new("calc", 2, 1, 3)));
        assert_eq!(
            err.to_string(),
            "calc:1:3: unexpected symbol %, expecting +, -, *, /, (, ), digit, letter"
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let input = Input::new(Cursor::new(vec![b'1', b' ', 0xFF]), 4).unwrap();
        let tokens = ArithmeticLexer::<_, NoCustomError>::new(input).collect::<Vec<_>>();

        assert_eq!(tokens.len(), 2);
        assert!(matches!(
            tokens[1].as_ref().unwrap_err().kind(),
            ErrorKind::Input(InputError::InvalidUtf8 { position: 2 })
        ));
    }
}
