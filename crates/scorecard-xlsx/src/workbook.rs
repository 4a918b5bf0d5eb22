//! In-memory workbook written by [`XlsxWriter`](crate::XlsxWriter)
//!
//! Only what the generated workbook needs: cells with a handful of font
//! styles, list validations, column widths and visibility, and two kinds of
//! conditional format.

use std::collections::{BTreeMap, BTreeSet};

use scorecard_core::{
    A1Style, CellContent, CellRef, GridSink, RangeRef, RefFormatter, RegionHandle,
};

use crate::error::{XlsxError, XlsxResult};

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters a sheet name may not contain
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Font style of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellStyle {
    #[default]
    Normal,
    Bold,
    Italic,
}

impl CellStyle {
    /// Index into the `cellXfs` table of the written styles part
    pub fn xf_id(self) -> u32 {
        match self {
            CellStyle::Normal => 0,
            CellStyle::Bold => 1,
            CellStyle::Italic => 2,
        }
    }

    pub fn from_xf_id(id: u32) -> Self {
        match id {
            1 => CellStyle::Bold,
            2 => CellStyle::Italic,
            _ => CellStyle::Normal,
        }
    }
}

/// A cell's content and style
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellContent,
    pub style: CellStyle,
}

/// A drop-down restricting one cell to the values of a range
#[derive(Debug, Clone, PartialEq)]
pub struct ListValidation {
    /// Constrained cell, 1-based `(row, col)`
    pub cell: (u32, u32),
    /// Source range as formula text, without the leading `=`
    pub source: String,
}

/// Conditional formats the emitter uses
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalFormat {
    /// Three-colour scale over fixed numeric stops
    ColorScale {
        sqref: String,
        /// `(value, ARGB colour)` for the low, middle and high stop
        stops: [(f64, String); 3],
    },
    /// Solid fill where the cell equals a text value
    HighlightText {
        sqref: String,
        text: String,
        /// ARGB fill colour
        fill: String,
    },
}

/// Width and visibility of one column
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnInfo {
    pub width: Option<f64>,
    pub hidden: bool,
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    visible: bool,
    cells: BTreeMap<(u32, u32), Cell>,
    columns: BTreeMap<u32, ColumnInfo>,
    list_validations: Vec<ListValidation>,
    conditional_formats: Vec<ConditionalFormat>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            visible: true,
            ..Self::default()
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set sheet visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // === Cell Access ===

    /// Get a cell by 1-based position
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Get a cell's content, `Empty` if never written
    pub fn value(&self, row: u32, col: u32) -> &CellContent {
        static EMPTY: CellContent = CellContent::Empty;
        self.cell(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Set a cell's content, keeping its style
    pub fn set_value(&mut self, row: u32, col: u32, value: CellContent) {
        self.cells.entry((row, col)).or_default().value = value;
    }

    /// Set content and style at once
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellContent, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    /// Iterate over cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &Cell)> {
        self.cells.iter().map(|(&(row, col), cell)| (row, col, cell))
    }

    /// Iterate mutably over cells in row-major order
    pub fn iter_cells_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut Cell)> {
        self.cells
            .iter_mut()
            .map(|(&(row, col), cell)| (row, col, cell))
    }

    /// Highest written row, 0 when empty
    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|&(row, _)| row).max().unwrap_or(0)
    }

    /// Number of formula cells
    pub fn formula_count(&self) -> usize {
        self.cells.values().filter(|c| c.value.is_formula()).count()
    }

    // === Columns ===

    pub fn column(&self, col: u32) -> ColumnInfo {
        self.columns.get(&col).copied().unwrap_or_default()
    }

    /// Columns with a custom width or hidden flag, in order
    pub fn columns(&self) -> impl Iterator<Item = (u32, ColumnInfo)> + '_ {
        self.columns.iter().map(|(&col, info)| (col, *info))
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.columns.entry(col).or_default().width = Some(width);
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) {
        self.columns.entry(col).or_default().hidden = hidden;
    }

    /// Size a column to its longest literal value plus padding
    ///
    /// Formula cells are skipped: their text is not what gets displayed.
    pub fn fit_column_width(&mut self, col: u32) {
        let longest = self
            .cells
            .iter()
            .filter(|(pos, cell)| pos.1 == col && !cell.value.is_formula())
            .map(|(_, cell)| cell.value.display_len())
            .max()
            .unwrap_or(0);
        if longest > 0 {
            self.set_column_width(col, longest as f64 + 2.0);
        }
    }

    // === Validation and formatting ===

    pub fn add_list_validation(&mut self, row: u32, col: u32, source: impl Into<String>) {
        self.list_validations.push(ListValidation {
            cell: (row, col),
            source: source.into(),
        });
    }

    pub fn list_validations(&self) -> &[ListValidation] {
        &self.list_validations
    }

    pub fn add_conditional_format(&mut self, format: ConditionalFormat) {
        self.conditional_formats.push(format);
    }

    pub fn conditional_formats(&self) -> &[ConditionalFormat] {
        &self.conditional_formats
    }
}

/// A workbook (spreadsheet document)
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name == name)
    }

    /// Get a mutable worksheet by name
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name == name)
    }

    /// Get the index of a sheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name == name)
    }

    /// Iterate over worksheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Iterate mutably over worksheets in tab order
    pub fn worksheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.worksheets.iter_mut()
    }

    /// Add a worksheet with a specific name, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> XlsxResult<usize> {
        validate_sheet_name(name)?;
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name.eq_ignore_ascii_case(name))
        {
            return Err(XlsxError::DuplicateSheetName(name.to_string()));
        }
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Add an already built worksheet
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> XlsxResult<usize> {
        let index = self.add_worksheet_with_name(&worksheet.name)?;
        self.worksheets[index] = worksheet;
        Ok(index)
    }

    /// Move a worksheet to a new position
    pub fn move_worksheet(&mut self, from: usize, to: usize) -> XlsxResult<()> {
        let count = self.worksheets.len();
        if from >= count {
            return Err(XlsxError::SheetOutOfBounds(from, count));
        }
        if to >= count {
            return Err(XlsxError::SheetOutOfBounds(to, count));
        }

        let worksheet = self.worksheets.remove(from);
        self.worksheets.insert(to, worksheet);
        Ok(())
    }

    /// Index of the first visible sheet, used as the active tab
    pub fn first_visible_sheet(&self) -> usize {
        self.worksheets
            .iter()
            .position(Worksheet::is_visible)
            .unwrap_or(0)
    }
}

fn validate_sheet_name(name: &str) -> XlsxResult<()> {
    if name.is_empty() {
        return Err(XlsxError::InvalidSheetName(name.to_string(), "empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(XlsxError::InvalidSheetName(
            name.to_string(),
            "longer than 31 characters",
        ));
    }
    if name.contains(INVALID_SHEET_CHARS) {
        return Err(XlsxError::InvalidSheetName(
            name.to_string(),
            "contains one of []:*?/\\",
        ));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(XlsxError::InvalidSheetName(
            name.to_string(),
            "starts or ends with an apostrophe",
        ));
    }
    Ok(())
}

impl GridSink for Workbook {
    fn create_region(
        &mut self,
        id: &str,
        _rows: u32,
        _cols: u32,
    ) -> scorecard_core::Result<RegionHandle> {
        match self.add_worksheet_with_name(id) {
            Ok(index) => Ok(RegionHandle(index)),
            Err(XlsxError::DuplicateSheetName(name)) => {
                Err(scorecard_core::Error::DuplicateRegion(name))
            }
            Err(e) => Err(scorecard_core::Error::sink(e.to_string())),
        }
    }

    fn region(&self, id: &str) -> Option<RegionHandle> {
        self.sheet_index(id).map(RegionHandle)
    }

    fn write_cell(
        &mut self,
        region: RegionHandle,
        row: u32,
        col: u32,
        value: CellContent,
    ) -> scorecard_core::Result<()> {
        let sheet = self
            .worksheet_mut(region.0)
            .ok_or_else(|| scorecard_core::Error::UnknownRegion(format!("#{}", region.0)))?;
        sheet.set_value(row, col, value);
        Ok(())
    }

    fn constrain_to_list(&mut self, cell: &CellRef, source: &RangeRef) -> scorecard_core::Result<()> {
        let source = A1Style::WORKBOOK.range(source);
        let sheet = self
            .worksheet_by_name_mut(&cell.table)
            .ok_or_else(|| scorecard_core::Error::UnknownRegion(cell.table.clone()))?;
        sheet.add_list_validation(cell.row, cell.col, source);
        Ok(())
    }

    fn set_region_visibility(
        &mut self,
        region: RegionHandle,
        hidden: bool,
    ) -> scorecard_core::Result<()> {
        let sheet = self
            .worksheet_mut(region.0)
            .ok_or_else(|| scorecard_core::Error::UnknownRegion(format!("#{}", region.0)))?;
        sheet.set_visible(!hidden);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_names() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet_with_name("Questions").unwrap(), 0);
        assert!(matches!(
            wb.add_worksheet_with_name("questions"),
            Err(XlsxError::DuplicateSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("a/b").is_err());
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb
            .add_worksheet_with_name("This name is far too long for a sheet")
            .is_err());
    }

    #[test]
    fn test_move_worksheet() {
        let mut wb = Workbook::new();
        for name in ["_data", "Questions", "Score"] {
            wb.add_worksheet_with_name(name).unwrap();
        }
        wb.move_worksheet(0, 2).unwrap();
        let names: Vec<_> = wb.worksheets().map(Worksheet::name).collect();
        assert_eq!(names, vec!["Questions", "Score", "_data"]);
        assert!(wb.move_worksheet(3, 0).is_err());
    }

    #[test]
    fn test_grid_sink() {
        let mut wb = Workbook::new();
        let data = wb.create_region("_data", 10, 3).unwrap();
        wb.write_cell(data, 2, 2, "Low".into()).unwrap();
        wb.set_region_visibility(data, true).unwrap();
        assert!(matches!(
            wb.create_region("_data", 1, 1),
            Err(scorecard_core::Error::DuplicateRegion(_))
        ));

        let questions = wb.create_region("Questions", 10, 3).unwrap();
        wb.constrain_to_list(
            &CellRef::new("Questions", 2, 3),
            &RangeRef::new("_data", 5, 2, 3, 1),
        )
        .unwrap();

        let sheet = wb.worksheet(questions.0).unwrap();
        assert_eq!(
            sheet.list_validations(),
            &[ListValidation {
                cell: (2, 3),
                source: "_data!$B$5:$B$7".into()
            }]
        );
        assert!(!wb.worksheet(data.0).unwrap().is_visible());
        assert_eq!(wb.first_visible_sheet(), 1);
    }

    #[test]
    fn test_fit_column_width_skips_formulas() {
        let mut ws = Worksheet::new("Questions");
        ws.set_value(1, 2, "Data Sources".into());
        ws.set_value(2, 2, CellContent::formula("=_data!$B$3&\"a very long formula\""));
        ws.fit_column_width(2);
        assert_eq!(ws.column(2).width, Some(14.0));
        ws.fit_column_width(9);
        assert_eq!(ws.column(9).width, None);
    }
}
