use std::collections::{BTreeSet, HashMap};

use itertools::Itertools as _;
use prettytable::{
    format::{Alignment, FormatBuilder, LinePosition, LineSeparator, TableFormat},
    Cell, Row as PtRow, Table as PtTable,
};
use tracing::debug;

use crate::{
    FollowSet, Grammar, Lookahead, MultipleProductionsError, NonTerminal, ParsingTableError,
    Production, Terminal, ENDMARKER,
};

/// Separator between the productions of a conflicting cell.
const CELL_SEPARATOR: &str = " ┆ ";

/// Title spanning the lookahead columns.
const TERMINAL_TITLE: &str = "Terminal";

/// A cell of the table, M[A, a].
///
/// Productions and the sync marker are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    productions: BTreeSet<Production>,
    sync: bool,
}

impl Entry {
    /// Productions in canonical order.
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn is_sync(&self) -> bool {
        self.sync && self.productions.is_empty()
    }

    /// The production of the cell, if it is the only one.
    pub fn production(&self) -> Option<&Production> {
        if self.productions.len() == 1 {
            self.productions.first()
        } else {
            None
        }
    }

    fn render(&self) -> String {
        if self.is_sync() {
            "sync".to_string()
        } else {
            self.productions.iter().join(CELL_SEPARATOR)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Row {
    entries: HashMap<Lookahead, Entry>,
}

impl Row {
    fn entry(&self, lookahead: &Lookahead) -> Option<&Entry> {
        self.entries.get(lookahead)
    }
}

/// An LL(1) parsing table, M[A, a] for every non-terminal A and every
/// terminal or endmarker a.
///
/// Absent entries behave as empty, non-sync entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingTable {
    terminals: Vec<Terminal>,
    non_terminals: Vec<NonTerminal>,
    rows: HashMap<NonTerminal, Row>,
}

impl ParsingTable {
    /// Creates an empty table over the given symbols.
    pub fn new(
        terminals: impl IntoIterator<Item = Terminal>,
        non_terminals: impl IntoIterator<Item = NonTerminal>,
    ) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
            non_terminals: non_terminals.into_iter().collect(),
            rows: HashMap::default(),
        }
    }

    /// Build the parsing table of a grammar.
    ///
    /// A grammar that is not LL(1) still gets a table; its conflicts are
    /// reported by [`ParsingTable::error`].
    pub fn build(grammar: &Grammar) -> Self {
        let first = grammar.first_sets();
        let follow = grammar.follow_sets(&first);
        let mut table = Self::new(
            grammar.terminals().iter().cloned(),
            grammar.non_terminals().iter().cloned(),
        );

        for production in grammar.productions() {
            let first_body = first.of_string(&production.body);

            for terminal in first_body.terminals.iter() {
                table.add_production(
                    &production.head,
                    &Lookahead::Terminal(terminal.clone()),
                    production.clone(),
                );
            }

            if first_body.includes_empty {
                let follow_head = follow.get(&production.head).cloned().unwrap_or_default();
                for lookahead in follow_lookaheads(&follow_head) {
                    table.add_production(&production.head, &lookahead, production.clone());
                }
            }
        }

        for non_terminal in grammar.non_terminals() {
            let Some(follow_set) = follow.get(non_terminal) else {
                continue;
            };

            for lookahead in follow_lookaheads(follow_set) {
                if table.is_empty(non_terminal, &lookahead) {
                    table.set_sync(non_terminal, &lookahead, true);
                }
            }
        }

        let conflicts = table.conflicts().count();
        if conflicts > 0 {
            debug!(conflicts, "built a parsing table with conflicts");
        } else {
            debug!(
                non_terminals = table.non_terminals.len(),
                terminals = table.terminals.len(),
                "built parsing table"
            );
        }

        table
    }

    fn entry_mut(&mut self, non_terminal: &NonTerminal, lookahead: &Lookahead) -> &mut Entry {
        self.rows
            .entry(non_terminal.clone())
            .or_default()
            .entries
            .entry(lookahead.clone())
            .or_default()
    }

    /// Adds `production` to M[A, a].
    ///
    /// Fails if the entry is a sync entry. Adding a production twice leaves
    /// the entry unchanged.
    pub fn add_production(
        &mut self,
        non_terminal: &NonTerminal,
        lookahead: &Lookahead,
        production: Production,
    ) -> bool {
        let entry = self.entry_mut(non_terminal, lookahead);
        if entry.sync {
            return false;
        }

        entry.productions.insert(production);
        true
    }

    /// Sets the sync flag of M[A, a]; fails if the entry holds productions.
    pub fn set_sync(
        &mut self,
        non_terminal: &NonTerminal,
        lookahead: &Lookahead,
        flag: bool,
    ) -> bool {
        if !self.is_empty(non_terminal, lookahead) {
            return false;
        }

        self.entry_mut(non_terminal, lookahead).sync = flag;
        true
    }

    pub fn entry(&self, non_terminal: &NonTerminal, lookahead: &Lookahead) -> Option<&Entry> {
        self.rows
            .get(non_terminal)
            .and_then(|row| row.entry(lookahead))
    }

    /// Productions of M[A, a] in canonical order.
    pub fn productions<'a>(
        &'a self,
        non_terminal: &NonTerminal,
        lookahead: &Lookahead,
    ) -> impl Iterator<Item = &'a Production> + 'a {
        self.entry(non_terminal, lookahead)
            .into_iter()
            .flat_map(Entry::productions)
    }

    pub fn is_empty(&self, non_terminal: &NonTerminal, lookahead: &Lookahead) -> bool {
        self.entry(non_terminal, lookahead)
            .map_or(true, Entry::is_empty)
    }

    pub fn is_sync(&self, non_terminal: &NonTerminal, lookahead: &Lookahead) -> bool {
        self.entry(non_terminal, lookahead)
            .is_some_and(Entry::is_sync)
    }

    /// The production of M[A, a] when it is the only one.
    pub fn get_production(
        &self,
        non_terminal: &NonTerminal,
        lookahead: &Lookahead,
    ) -> Option<&Production> {
        self.entry(non_terminal, lookahead)
            .and_then(Entry::production)
    }

    /// Terminals in declaration order.
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    /// Non-terminals in declaration order.
    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    /// Column indices: the terminals, then the endmarker.
    pub fn lookaheads(&self) -> impl Iterator<Item = Lookahead> + '_ {
        self.terminals
            .iter()
            .cloned()
            .map(Lookahead::Terminal)
            .chain([Lookahead::Endmarker])
    }

    /// Every entry holding more than one production, row by row.
    pub fn conflicts(&self) -> impl Iterator<Item = MultipleProductionsError> + '_ {
        self.non_terminals
            .iter()
            .cartesian_product(self.lookaheads().collect::<Vec<_>>())
            .filter_map(|(non_terminal, lookahead)| {
                let entry = self.entry(non_terminal, &lookahead)?;
                (entry.productions.len() > 1).then(|| MultipleProductionsError {
                    non_terminal: non_terminal.clone(),
                    lookahead,
                    productions: entry.productions.iter().cloned().collect(),
                })
            })
    }

    /// Reports every conflicting entry, or `None` if the table is LL(1).
    pub fn error(&self) -> Option<ParsingTableError> {
        let errors = self.conflicts().collect::<Vec<_>>();
        (!errors.is_empty()).then_some(ParsingTableError { errors })
    }
}

fn follow_lookaheads(follow: &FollowSet) -> impl Iterator<Item = Lookahead> + '_ {
    follow
        .terminals
        .iter()
        .cloned()
        .map(Lookahead::Terminal)
        .chain(follow.includes_endmarker.then_some(Lookahead::Endmarker))
}

fn box_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separators(&[LinePosition::Top], LineSeparator::new('─', '┬', '┌', '┐'))
        .separators(&[LinePosition::Intern], LineSeparator::new('─', '┼', '├', '┤'))
        .separators(&[LinePosition::Bottom], LineSeparator::new('─', '┴', '└', '┘'))
        .padding(1, 1)
        .build()
}

fn centered(content: &str) -> Cell {
    Cell::new_align(content, Alignment::CENTER)
}

impl Grammar {
    /// Builds the parsing table and tells whether it is free of conflicts.
    pub fn is_ll1(&self) -> bool {
        ParsingTable::build(self).error().is_none()
    }
}

/// Renders the table in a box, under a title row spanning the lookahead
/// columns.
///
/// prettytable draws a junction at every column boundary, spans included,
/// so the body is rendered without the title and the first border is
/// redrawn around the span.
impl std::fmt::Display for ParsingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lookaheads = self.lookaheads().collect::<Vec<_>>();
        let mut headers = lookaheads
            .iter()
            .map(|lookahead| match lookahead {
                Lookahead::Terminal(t) => t.name().to_string(),
                Lookahead::Endmarker => ENDMARKER.to_string(),
            })
            .collect::<Vec<_>>();

        let rows = self
            .non_terminals
            .iter()
            .map(|non_terminal| {
                let cells = lookaheads
                    .iter()
                    .map(|lookahead| {
                        self.entry(non_terminal, lookahead)
                            .map(Entry::render)
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>();
                (non_terminal.name(), cells)
            })
            .collect::<Vec<_>>();

        // The title must fit over the lookahead columns, widen the last one
        // if it does not.
        let widths = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                rows.iter()
                    .map(|(_, cells)| cells[column].chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        let span = widths.iter().map(|width| width + 2).sum::<usize>() + widths.len() - 1;
        let title = TERMINAL_TITLE.chars().count() + 2;

        if span < title {
            if let (Some(header), Some(width)) = (headers.last_mut(), widths.last()) {
                *header = format!("{:^w$}", header, w = width + title - span);
            }
        }

        let mut table = PtTable::new();
        table.set_format(box_format());
        table.add_row(PtRow::new(
            [centered("Non-Terminal")]
                .into_iter()
                .chain(headers.iter().map(|header| centered(header)))
                .collect(),
        ));

        for (name, cells) in rows.iter() {
            table.add_row(PtRow::new(
                [centered(name)]
                    .into_iter()
                    .chain(cells.iter().map(|cell| centered(cell)))
                    .collect(),
            ));
        }

        let body = table.to_string();
        let mut lines = body.lines();

        let columns = lines
            .next()
            .unwrap_or_default()
            .trim_start_matches('┌')
            .trim_end_matches('┐')
            .split('┬')
            .map(|border| border.chars().count())
            .collect::<Vec<_>>();
        let Some((first, spanned)) = columns.split_first() else {
            return f.write_str(&body);
        };

        let span = spanned.iter().sum::<usize>() + spanned.len().saturating_sub(1);
        let left = "─".repeat(*first);

        writeln!(f, "┌{left}┬{}┐", "─".repeat(span))?;
        writeln!(f, "│{}│{TERMINAL_TITLE:^span$}│", " ".repeat(*first))?;
        writeln!(
            f,
            "├{left}┼{}┤",
            spanned.iter().map(|width| "─".repeat(*width)).join("┬")
        )?;

        for line in lines {
            writeln!(f, "{line}")?;
        }

        Ok(())
    }
}
