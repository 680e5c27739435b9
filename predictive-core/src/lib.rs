pub mod analysis;
pub mod error;
pub mod grammar;
pub mod input;
pub mod lexer;
pub mod ll;
pub mod position;
pub mod production;
pub mod symbol;
pub mod token;

pub use analysis::*;
pub use grammar::{Grammar, GrammarBuilder};
pub use input::{Input, DEFAULT_HALF_SIZE};
pub use lexer::ArithmeticLexer;
pub use ll::{Entry, ParsingTable, PredictiveParser};
pub use position::*;
pub use production::*;
pub use symbol::*;
pub use token::*;

pub mod traits {
    pub use crate::lexer::traits::Lexer;
    pub use crate::ll::traits::Action;
}

pub use error::{
    ErrorKind, ExpectedSymbols, GrammarError, InputError, MultipleProductionsError,
    NoCustomError, ParsingTableError, PredictiveError,
};
pub type PredictiveResult<T, E> = Result<T, PredictiveError<E>>;
