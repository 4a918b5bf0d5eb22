//! Grid-region sink
//!
//! The four operations layout and emitters need from a spreadsheet-like
//! target. The XLSX workbook implements this for real output;
//! [`MemoryGrid`](crate::grid::MemoryGrid) implements it in memory for the
//! script backend's reference table and for tests.

use crate::address::{CellRef, RangeRef};
use crate::error::Result;
use crate::value::CellContent;

/// Opaque handle to a region (sheet or table) created in a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionHandle(pub usize);

pub trait GridSink {
    /// Create a named region; `rows`/`cols` are a sizing hint
    fn create_region(&mut self, id: &str, rows: u32, cols: u32) -> Result<RegionHandle>;

    /// Look up a region created earlier
    fn region(&self, id: &str) -> Option<RegionHandle>;

    /// Write one cell (1-based row and column)
    fn write_cell(
        &mut self,
        region: RegionHandle,
        row: u32,
        col: u32,
        value: CellContent,
    ) -> Result<()>;

    /// Restrict `cell` to the values listed in `source`
    fn constrain_to_list(&mut self, cell: &CellRef, source: &RangeRef) -> Result<()>;

    fn set_region_visibility(&mut self, region: RegionHandle, hidden: bool) -> Result<()>;

    /// Return the handle of `id`, creating the region if needed
    fn ensure_region(&mut self, id: &str, rows: u32, cols: u32) -> Result<RegionHandle> {
        match self.region(id) {
            Some(handle) => Ok(handle),
            None => self.create_region(id, rows, cols),
        }
    }

    /// Write a cell addressed logically
    fn write_at(&mut self, cell: &CellRef, value: CellContent) -> Result<()> {
        let region = self
            .region(&cell.table)
            .ok_or_else(|| crate::Error::UnknownRegion(cell.table.clone()))?;
        self.write_cell(region, cell.row, cell.col, value)
    }
}
