use std::io::Cursor;

use predictive::{
    grammar, traits::Action, ArithmeticLexer, Grammar, Input, NoCustomError, PredictiveResult,
    Production, Token,
};

/// `E → T E'`, `E' → + T E' | ε`, `T → F T'`, `T' → * F T' | ε`,
/// `F → ( E ) | id`.
pub fn expression_grammar() -> Grammar {
    grammar! {
        terminals: ["+", "*", "(", ")", "id"],
        non_terminals: ["E", "E'", "T", "T'", "F"],
        start: "E",
        rules: {
            "E" => "T" "E'";
            "E'" => "+" "T" "E'";
            "E'" => ;
            "T" => "F" "T'";
            "T'" => "*" "F" "T'";
            "T'" => ;
            "F" => "(" "E" ")";
            "F" => "id";
        }
    }
    .expect("the expression grammar is well formed")
}

/// The expression grammar over the four operators and both operand kinds.
pub fn arithmetic_grammar() -> Grammar {
    grammar! {
        terminals: ["+", "-", "*", "/", "(", ")", "num", "id"],
        non_terminals: ["E", "E'", "T", "T'", "F"],
        start: "E",
        rules: {
            "E" => "T" "E'";
            "E'" => "+" "T" "E'";
            "E'" => "-" "T" "E'";
            "E'" => ;
            "T" => "F" "T'";
            "T'" => "*" "F" "T'";
            "T'" => "/" "F" "T'";
            "T'" => ;
            "F" => "(" "E" ")";
            "F" => "num";
            "F" => "id";
        }
    }
    .expect("the arithmetic grammar is well formed")
}

/// `E → E + T | T`, `T → id`.
pub fn left_recursive_grammar() -> Grammar {
    grammar! {
        terminals: ["+", "id"],
        non_terminals: ["E", "T"],
        start: "E",
        rules: {
            "E" => "E" "+" "T";
            "E" => "T";
            "T" => "id";
        }
    }
    .expect("the left recursive grammar is well formed")
}

/// `S → A b`, `A → a | ε`.
pub fn epsilon_follow_grammar() -> Grammar {
    grammar! {
        terminals: ["a", "b"],
        non_terminals: ["S", "A"],
        start: "S",
        rules: {
            "S" => "A" "b";
            "A" => "a";
            "A" => ;
        }
    }
    .expect("the epsilon follow grammar is well formed")
}

/// Lexes `source` with a buffer of `half_size` bytes per half.
pub fn lexer(source: &str, half_size: usize) -> ArithmeticLexer<Cursor<Vec<u8>>> {
    let input = Input::new(Cursor::new(source.as_bytes().to_vec()), half_size)
        .expect("the half size is positive");
    ArithmeticLexer::new(input).with_filename("test")
}

/// Records every expansion as `(production, lookahead lexeme)`.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<(String, String)>,
}

impl Recorder {
    pub fn productions(&self) -> Vec<&str> {
        self.events.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Action<NoCustomError> for Recorder {
    fn on_event(
        &mut self,
        production: &Production,
        token: &Token,
    ) -> PredictiveResult<(), NoCustomError> {
        self.events
            .push((production.to_string(), token.terminal.to_string()));
        Ok(())
    }
}
