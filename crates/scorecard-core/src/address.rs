//! Column/row algebra and logical cell addressing
//!
//! Every coordinate in this crate is 1-based: row 1 is the first row and
//! column 1 is column `A`. Addresses are *logical*: a table (sheet) name
//! plus coordinates. Turning them into reference text is the job of a
//! [`RefFormatter`], which each backend chooses for itself.
//!
//! Both backends must produce byte-identical column letters for the same
//! index, so the numbering lives here and nowhere else.

use crate::error::{Error, Result};
use std::fmt;

/// Highest column index a worksheet can hold (`XFD`)
pub const MAX_COLUMN: u32 = 16_384;

/// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA, ...)
///
/// Bijective base-26: subtract one, take the remainder as the rightmost
/// letter, divide, repeat until nothing is left.
///
/// # Examples
/// ```
/// use scorecard_core::address::column_letters;
///
/// assert_eq!(column_letters(1), "A");
/// assert_eq!(column_letters(28), "AB");
/// assert_eq!(column_letters(703), "AAA");
/// ```
pub fn column_letters(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index;

    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1 - rem) / 26;
    }

    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters back to a 1-based index (A = 1, Z = 26, AA = 27, ...)
pub fn column_index(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col
            .saturating_mul(26)
            .saturating_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }

    if col > MAX_COLUMN {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLUMN));
    }

    Ok(col)
}

/// A single cell inside a named table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// Table (sheet) name
    pub table: String,
    /// Row, 1-based
    pub row: u32,
    /// Column, 1-based
    pub col: u32,
}

impl CellRef {
    pub fn new(table: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            table: table.into(),
            row,
            col,
        }
    }

    /// The same column, `rows` further down
    pub fn offset_rows(&self, rows: u32) -> Self {
        Self {
            table: self.table.clone(),
            row: self.row + rows,
            col: self.col,
        }
    }

    /// Unqualified A1 text, e.g. `C7`
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.table, self.to_a1_string())
    }
}

/// A rectangular block of cells inside a named table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeRef {
    /// Table (sheet) name
    pub table: String,
    /// Top row, 1-based
    pub row: u32,
    /// Left column, 1-based
    pub col: u32,
    /// Number of rows (at least 1)
    pub rows: u32,
    /// Number of columns (at least 1)
    pub cols: u32,
}

impl RangeRef {
    pub fn new(table: impl Into<String>, row: u32, col: u32, rows: u32, cols: u32) -> Self {
        Self {
            table: table.into(),
            row,
            col,
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    /// Bottom row, inclusive
    pub fn end_row(&self) -> u32 {
        self.row + self.rows - 1
    }

    /// Right column, inclusive
    pub fn end_col(&self) -> u32 {
        self.col + self.cols - 1
    }

    /// Cell at a 0-based offset inside the range
    pub fn cell_at(&self, row_offset: u32, col_offset: u32) -> CellRef {
        CellRef::new(self.table.clone(), self.row + row_offset, self.col + col_offset)
    }

    /// Check if a cell is within this range
    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.table == self.table
            && cell.row >= self.row
            && cell.row <= self.end_row()
            && cell.col >= self.col
            && cell.col <= self.end_col()
    }

    /// Check if this range shares at least one cell with another
    pub fn overlaps(&self, other: &RangeRef) -> bool {
        self.table == other.table
            && self.row <= other.end_row()
            && self.end_row() >= other.row
            && self.col <= other.end_col()
            && self.end_col() >= other.col
    }

    /// Iterate over all cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.row..=self.end_row()).flat_map(move |row| {
            (self.col..=self.end_col()).map(move |col| CellRef::new(self.table.clone(), row, col))
        })
    }

    /// Unqualified A1 text, e.g. `B5:C8`
    pub fn to_a1_string(&self) -> String {
        if self.rows == 1 && self.cols == 1 {
            format!("{}{}", column_letters(self.col), self.row)
        } else {
            format!(
                "{}{}:{}{}",
                column_letters(self.col),
                self.row,
                column_letters(self.end_col()),
                self.end_row()
            )
        }
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.table, self.to_a1_string())
    }
}

/// Turns logical addresses into reference text for one target grammar
pub trait RefFormatter {
    /// Qualified reference to a single cell
    fn cell(&self, cell: &CellRef) -> String;

    /// Qualified reference to a range
    fn range(&self, range: &RangeRef) -> String;
}

/// When to wrap a sheet name in single quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetQuoting {
    /// Always quote (`'Sheet'!A1`)
    Always,
    /// Quote only names that would not parse bare
    WhenNeeded,
}

/// A1-style reference formatting (`Sheet!$A$1`, `'My Sheet'!$A$1:$B$4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Style {
    pub quoting: SheetQuoting,
    /// Whether single-cell references carry `$` markers. Ranges always do.
    pub absolute_cells: bool,
}

impl A1Style {
    /// Workbook formulas: bare sheet names where possible, absolute cells
    pub const WORKBOOK: A1Style = A1Style {
        quoting: SheetQuoting::WhenNeeded,
        absolute_cells: true,
    };

    /// Linked response spreadsheet: quoted sheet names, relative response cells
    pub const SCRIPT: A1Style = A1Style {
        quoting: SheetQuoting::Always,
        absolute_cells: false,
    };

    fn sheet(&self, name: &str) -> String {
        let quote = match self.quoting {
            SheetQuoting::Always => true,
            SheetQuoting::WhenNeeded => sheet_name_needs_quotes(name),
        };
        if quote {
            format!("'{}'", name.replace('\'', "''"))
        } else {
            name.to_string()
        }
    }
}

impl RefFormatter for A1Style {
    fn cell(&self, cell: &CellRef) -> String {
        let marker = if self.absolute_cells { "$" } else { "" };
        format!(
            "{}!{}{}{}{}",
            self.sheet(&cell.table),
            marker,
            column_letters(cell.col),
            marker,
            cell.row
        )
    }

    fn range(&self, range: &RangeRef) -> String {
        let start = format!("${}${}", column_letters(range.col), range.row);
        if range.rows == 1 && range.cols == 1 {
            return format!("{}!{}", self.sheet(&range.table), start);
        }
        format!(
            "{}!{}:${}${}",
            self.sheet(&range.table),
            start,
            column_letters(range.end_col()),
            range.end_row()
        )
    }
}

/// Whether a sheet name must be quoted inside a formula
///
/// Bare names may only hold letters, digits, `_` and `.`, may not start
/// with a digit, and may not look like a cell reference (`AB12`).
pub fn sheet_name_needs_quotes(name: &str) -> bool {
    if name.is_empty() {
        return true;
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return true;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }

    let letters = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let looks_like_cell = letters.len() < name.len()
        && letters.chars().all(|c| c.is_ascii_alphabetic())
        && column_index(letters).is_ok();
    looks_like_cell
}
