mod arithmetic;

pub use arithmetic::*;

pub mod traits {
    use crate::{PredictiveResult, Token};

    /// The trait for a lexer.
    ///
    /// A lexer is a stream of tokens; exhaustion stands for end of input.
    /// Any iterator of token results is a lexer.
    pub trait Lexer<Error>: Iterator<Item = PredictiveResult<Token, Error>> {
        fn next_token(&mut self) -> Option<PredictiveResult<Token, Error>> {
            self.next()
        }
    }

    impl<Error, I> Lexer<Error> for I where I: Iterator<Item = PredictiveResult<Token, Error>> {}
}
