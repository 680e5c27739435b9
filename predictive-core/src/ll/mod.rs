use tracing::{debug, trace};

use crate::{
    lexer::traits::Lexer, traits::Action, ErrorKind, Grammar, NonTerminal, ParsingTableError,
    Position, PredictiveError, PredictiveResult, Symbol, Token,
};

mod table;

pub use table::*;

pub mod traits {
    use crate::{PredictiveResult, Production, Token};

    /// Callback fired each time the parser expands a non-terminal.
    ///
    /// Receives the production used for the expansion and the lookahead
    /// token which selected it. An error aborts the parse.
    pub trait Action<Error> {
        fn on_event(
            &mut self,
            production: &Production,
            token: &Token,
        ) -> PredictiveResult<(), Error>;
    }

    impl<Error, F> Action<Error> for F
    where
        F: FnMut(&Production, &Token) -> PredictiveResult<(), Error>,
    {
        fn on_event(
            &mut self,
            production: &Production,
            token: &Token,
        ) -> PredictiveResult<(), Error> {
            self(production, token)
        }
    }
}

/// A table-driven LL(1) parser.
///
/// The parser only borrows its grammar and table, and keeps no state
/// between parses.
pub struct PredictiveParser<'g> {
    grammar: &'g Grammar,
    table: &'g ParsingTable,
}

impl<'g> PredictiveParser<'g> {
    /// Creates a parser; fails if the table has conflicting entries.
    pub fn new(grammar: &'g Grammar, table: &'g ParsingTable) -> Result<Self, ParsingTableError> {
        if let Some(err) = table.error() {
            debug!(conflicts = err.len(), "refusing a parsing table with conflicts");
            return Err(err);
        }

        Ok(Self { grammar, table })
    }

    pub fn grammar(&self) -> &Grammar {
        self.grammar
    }

    pub fn table(&self) -> &ParsingTable {
        self.table
    }

    /// Parses the token stream, stopping at the first syntax error.
    ///
    /// The action is called once per expansion, in leftmost-derivation
    /// order.
    pub fn parse<Error, L, A>(&self, lexer: &mut L, action: &mut A) -> PredictiveResult<(), Error>
    where
        L: Lexer<Error>,
        A: Action<Error>,
    {
        let mut stack = self.initial_stack();
        let mut lookahead = next_lookahead(lexer)?;

        loop {
            let top = stack.pop().unwrap_or(Symbol::Endmarker);
            trace!(%top, lookahead = %lookahead.terminal, "step");

            match top {
                Symbol::Endmarker => {
                    return if lookahead.is_endmarker() {
                        trace!("accept");
                        Ok(())
                    } else {
                        Err(trailing_input(lookahead))
                    };
                }

                Symbol::Terminal(_) => {
                    if !lookahead.terminal.matches(&top) {
                        let position = lookahead.position.clone();
                        return Err(PredictiveError::new(
                            ErrorKind::UnexpectedTerminalOnStack(top),
                            Some(position),
                        ));
                    }

                    lookahead = next_lookahead(lexer)?;
                }

                Symbol::NonTerminal(non_terminal) => {
                    let Some(production) =
                        self.table.get_production(&non_terminal, &lookahead.terminal)
                    else {
                        return Err(unacceptable_input(non_terminal, lookahead));
                    };

                    stack.extend(production.body.iter().rev().cloned());
                    action.on_event(production, &lookahead)?;
                }
            }
        }
    }

    /// Parses the token stream, recovering from syntax errors in panic mode.
    ///
    /// On an error entry the parser pops the non-terminal if the lookahead
    /// is in its synchronizing set, and skips the lookahead otherwise. A
    /// mismatched terminal is popped. Tokens left after the start symbol
    /// is derived are skipped.
    ///
    /// Returns the syntax errors met along the way, empty if the input
    /// was accepted as is. Lexer and action failures still abort the parse.
    pub fn parse_with_recovery<Error, L, A>(
        &self,
        lexer: &mut L,
        action: &mut A,
    ) -> PredictiveResult<Vec<PredictiveError<Error>>, Error>
    where
        L: Lexer<Error>,
        A: Action<Error>,
    {
        let mut stack = self.initial_stack();
        let mut lookahead = next_lookahead(lexer)?;
        let mut errors = Vec::default();
        let mut skipping = false;

        loop {
            let top = stack.pop().unwrap_or(Symbol::Endmarker);
            trace!(%top, lookahead = %lookahead.terminal, skipping, "step");

            match top {
                Symbol::Endmarker => {
                    if lookahead.is_endmarker() {
                        debug!(errors = errors.len(), "parse done");
                        return Ok(errors);
                    }

                    if !skipping {
                        errors.push(trailing_input(lookahead.clone()));
                    }
                    skipping = true;
                    lookahead = next_lookahead(lexer)?;
                    stack.push(Symbol::Endmarker);
                }

                Symbol::Terminal(_) => {
                    if lookahead.terminal.matches(&top) {
                        skipping = false;
                        lookahead = next_lookahead(lexer)?;
                    } else {
                        trace!(%top, "popping unmatched terminal");
                        errors.push(PredictiveError::new(
                            ErrorKind::UnexpectedTerminalOnStack(top),
                            Some(lookahead.position.clone()),
                        ));
                    }
                }

                Symbol::NonTerminal(non_terminal) => {
                    if let Some(production) =
                        self.table.get_production(&non_terminal, &lookahead.terminal)
                    {
                        skipping = false;
                        stack.extend(production.body.iter().rev().cloned());
                        action.on_event(production, &lookahead)?;
                        continue;
                    }

                    if !skipping {
                        errors.push(unacceptable_input(non_terminal.clone(), lookahead.clone()));
                    }

                    if lookahead.is_endmarker()
                        || self.table.is_sync(&non_terminal, &lookahead.terminal)
                    {
                        trace!(%non_terminal, "popping on sync");
                        skipping = false;
                    } else {
                        trace!(token = %lookahead, "skipping");
                        skipping = true;
                        lookahead = next_lookahead(lexer)?;
                        stack.push(Symbol::NonTerminal(non_terminal));
                    }
                }
            }
        }
    }

    fn initial_stack(&self) -> Vec<Symbol> {
        vec![
            Symbol::Endmarker,
            Symbol::NonTerminal(self.grammar.start().clone()),
        ]
    }
}

/// Pulls the next token; an exhausted lexer yields the endmarker.
fn next_lookahead<Error, L>(lexer: &mut L) -> PredictiveResult<Token, Error>
where
    L: Lexer<Error>,
{
    match lexer.next_token() {
        Some(token) => token,
        None => Ok(Token::endmarker(Position::default())),
    }
}

fn unacceptable_input<Error>(non_terminal: NonTerminal, token: Token) -> PredictiveError<Error> {
    let position = token.position.clone();
    PredictiveError::new(
        ErrorKind::UnacceptableInput {
            non_terminal,
            token,
        },
        Some(position),
    )
}

fn trailing_input<Error>(token: Token) -> PredictiveError<Error> {
    let position = token.position.clone();
    PredictiveError::new(ErrorKind::TrailingInput(token), Some(position))
}

#[cfg(test)]
mod tests {
    use super::{ParsingTable, PredictiveParser};
    use crate::{
        grammar::fixtures::{epsilon_follow_grammar, expression_grammar, left_recursive_grammar},
        lexer::fixtures::tokens,
        ErrorKind, NoCustomError, PredictiveError, PredictiveResult, Production, Symbol, Token,
    };

    /// Parses `input` and collects the productions and lookaheads of every
    /// expansion.
    fn parse_events(input: &[&str]) -> (PredictiveResult<(), NoCustomError>, Vec<String>) {
        let grammar = expression_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        let mut events = Vec::default();
        let result = parser.parse(&mut tokens(input), &mut |p: &Production, t: &Token| {
            events.push(format!("{p} @ {}", t.lexeme));
            Ok::<_, PredictiveError<NoCustomError>>(())
        });

        (result, events)
    }

    #[test]
    fn test_parse_sum() {
        let (result, events) = parse_events(&["id", "+", "id"]);

        assert!(result.is_ok());
        assert_eq!(
            events,
            vec![
                "E → T E' @ id",
                "T → F T' @ id",
                "F → \"id\" @ id",
                "T' → ε @ +",
                "E' → \"+\" T E' @ +",
                "T → F T' @ id",
                "F → \"id\" @ id",
                "T' → ε @ ",
                "E' → ε @ ",
            ]
        );
    }

    #[test]
    fn test_parse_nested() {
        let (result, events) = parse_events(&["(", "id", "+", "id", ")", "*", "id"]);

        assert!(result.is_ok());
        assert_eq!(events[0], "E → T E' @ (");
        assert_eq!(events[2], "F → \"(\" E \")\" @ (");
        assert_eq!(events.last().unwrap(), "E' → ε @ ");
    }

    #[test]
    fn test_unacceptable_input() {
        let (result, events) = parse_events(&["id", "+", "*"]);
        let err = result.unwrap_err();

        match err.kind() {
            ErrorKind::UnacceptableInput {
                non_terminal,
                token,
            } => {
                assert_eq!(non_terminal.name(), "T");
                assert_eq!(token.lexeme, "*");
            }
            kind => panic!("unexpected error kind: {kind}"),
        }
        assert_eq!(err.position().unwrap().offset, 2);
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let (result, _) = parse_events(&["(", "id"]);

        match result.unwrap_err().into_kind() {
            ErrorKind::UnexpectedTerminalOnStack(symbol) => assert_eq!(symbol, Symbol::term(")")),
            kind => panic!("unexpected error kind: {kind}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let (result, events) = parse_events(&[]);

        assert!(matches!(
            result.unwrap_err().kind(),
            ErrorKind::UnacceptableInput { token, .. } if token.is_endmarker()
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_trailing_input() {
        let grammar = epsilon_follow_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        let result = parser.parse(&mut tokens(&["b", "b"]), &mut |_: &Production, _: &Token| {
            Ok::<_, PredictiveError<NoCustomError>>(())
        });

        match result.unwrap_err().into_kind() {
            ErrorKind::TrailingInput(token) => assert_eq!(token.lexeme, "b"),
            kind => panic!("unexpected error kind: {kind}"),
        }
    }

    #[test]
    fn test_action_failure_aborts() {
        let grammar = expression_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        let mut calls = 0;
        let result = parser.parse(&mut tokens(&["id"]), &mut |_: &Production, _: &Token| {
            calls += 1;
            Err(PredictiveError::from(ErrorKind::Other(NoCustomError)))
        });

        assert!(matches!(result.unwrap_err().kind(), ErrorKind::Other(NoCustomError)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_conflicting_table_is_refused() {
        let grammar = left_recursive_grammar();
        let table = ParsingTable::build(&grammar);

        let err = PredictiveParser::new(&grammar, &table).err().unwrap();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn test_recovery_on_valid_input() {
        let grammar = expression_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        let errors = parser
            .parse_with_recovery(&mut tokens(&["id", "*", "id"]), &mut |_: &Production, _: &Token| {
                Ok::<_, PredictiveError<NoCustomError>>(())
            })
            .unwrap();

        assert!(errors.is_empty());
    }

    #[test]
    fn test_recovery_skips_and_syncs() {
        let grammar = expression_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        // The leading "+" is skipped, the second one syncs F after "*".
        let errors = parser
            .parse_with_recovery(
                &mut tokens(&["+", "id", "*", "+", "id"]),
                &mut |_: &Production, _: &Token| Ok::<_, PredictiveError<NoCustomError>>(()),
            )
            .unwrap();

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0].kind(),
            ErrorKind::UnacceptableInput { non_terminal, token }
                if non_terminal.name() == "E" && token.lexeme == "+"
        ));
        assert!(matches!(
            errors[1].kind(),
            ErrorKind::UnacceptableInput { non_terminal, token }
                if non_terminal.name() == "F" && token.lexeme == "+"
        ));
    }

    #[test]
    fn test_recovery_trailing_input() {
        let grammar = epsilon_follow_grammar();
        let table = ParsingTable::build(&grammar);
        let parser = PredictiveParser::new(&grammar, &table).unwrap();

        let errors = parser
            .parse_with_recovery(
                &mut tokens(&["a", "b", "a", "b"]),
                &mut |_: &Production, _: &Token| Ok::<_, PredictiveError<NoCustomError>>(()),
            )
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind(), ErrorKind::TrailingInput(token) if token.lexeme == "a"));
    }
}
