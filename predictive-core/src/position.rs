use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
/// The location of a token in a stream.
///
/// `line` and `column` are 1-based, `0` meaning unknown. `offset` counts
/// runes from the start of the stream.
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(filename: impl Into<String>, offset: usize, line: usize, column: usize) -> Self {
        Self {
            filename: filename.into(),
            offset,
            line,
            column,
        }
    }

    /// A position known only by its rune offset.
    pub fn at_offset(offset: usize) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// True when both line and column are known.
    pub fn has_line_column(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.filename.is_empty() {
            write!(f, "{}:", self.filename)?;
        }

        if self.has_line_column() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}", self.offset)
        }
    }
}

/// Moves a position to the first column of the next line.
pub struct NextLine;
/// Moves a position one column to the right.
pub struct NextColumn;

impl Add<NextLine> for Position {
    type Output = Self;

    fn add(mut self, rhs: NextLine) -> Self::Output {
        self += rhs;
        self
    }
}

impl Add<NextColumn> for Position {
    type Output = Self;

    fn add(mut self, rhs: NextColumn) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<NextLine> for Position {
    fn add_assign(&mut self, _: NextLine) {
        self.offset += 1;
        self.column = 1;
        self.line += 1;
    }
}

impl AddAssign<NextColumn> for Position {
    fn add_assign(&mut self, _: NextColumn) {
        self.offset += 1;
        self.column += 1;
    }
}
