//! Predictive (LL(1)) parsing.
//!
//! Declare a grammar, build its parsing table and drive a
//! [`PredictiveParser`] with any token stream.
//!
//! ```
//! use predictive::{grammar, ParsingTable, PredictiveParser, Production, Token};
//! use predictive::{Input, ArithmeticLexer, NoCustomError, PredictiveError};
//!
//! let grammar = grammar! {
//!     terminals: ["+", "id"],
//!     non_terminals: ["E", "E'"],
//!     start: "E",
//!     rules: {
//!         "E" => "id" "E'";
//!         "E'" => "+" "id" "E'";
//!         "E'" => ;
//!     }
//! }
//! .unwrap();
//!
//! let table = ParsingTable::build(&grammar);
//! let parser = PredictiveParser::new(&grammar, &table).unwrap();
//!
//! let input = Input::new("a + b".as_bytes(), 64).unwrap();
//! let mut lexer = ArithmeticLexer::<_, NoCustomError>::new(input);
//! let mut expansions = 0;
//!
//! parser
//!     .parse(&mut lexer, &mut |_: &Production, _: &Token| {
//!         expansions += 1;
//!         Ok::<_, PredictiveError<NoCustomError>>(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(expansions, 3);
//! ```
pub use predictive_core::*;
