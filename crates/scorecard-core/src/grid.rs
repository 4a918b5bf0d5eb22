//! In-memory grid sink

use std::collections::BTreeMap;

use crate::address::{CellRef, RangeRef};
use crate::error::{Error, Result};
use crate::sink::{GridSink, RegionHandle};
use crate::value::CellContent;

/// One named table of sparse cells
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    name: String,
    hidden: bool,
    cells: BTreeMap<(u32, u32), CellContent>,
    list_constraints: Vec<(CellRef, RangeRef)>,
}

impl MemoryTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Cell content at a 1-based position (`Empty` if never written)
    pub fn get(&self, row: u32, col: u32) -> &CellContent {
        static EMPTY: CellContent = CellContent::Empty;
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Bottom-right corner of the written area, `(0, 0)` when empty
    pub fn extent(&self) -> (u32, u32) {
        self.cells
            .keys()
            .fold((0, 0), |(r, c), &(row, col)| (r.max(row), c.max(col)))
    }

    /// Dense row-major copy of the written area, padded with `Empty`
    pub fn rows(&self) -> Vec<Vec<CellContent>> {
        let (max_row, max_col) = self.extent();
        (1..=max_row)
            .map(|row| (1..=max_col).map(|col| self.get(row, col).clone()).collect())
            .collect()
    }

    pub fn list_constraints(&self) -> &[(CellRef, RangeRef)] {
        &self.list_constraints
    }
}

/// A set of named tables implementing [`GridSink`]
#[derive(Debug, Clone, Default)]
pub struct MemoryGrid {
    tables: Vec<MemoryTable>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, id: &str) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| t.name == id)
    }

    /// Read a cell addressed logically
    pub fn get(&self, cell: &CellRef) -> &CellContent {
        static EMPTY: CellContent = CellContent::Empty;
        self.table(&cell.table)
            .map(|t| t.get(cell.row, cell.col))
            .unwrap_or(&EMPTY)
    }

    /// Write a cell, creating its table on first use
    pub fn set(&mut self, cell: &CellRef, value: CellContent) {
        let index = match self.tables.iter().position(|t| t.name == cell.table) {
            Some(index) => index,
            None => {
                self.tables.push(MemoryTable {
                    name: cell.table.clone(),
                    ..MemoryTable::default()
                });
                self.tables.len() - 1
            }
        };
        store(&mut self.tables[index], cell.row, cell.col, value);
    }

    fn table_mut(&mut self, region: RegionHandle) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(region.0)
            .ok_or_else(|| Error::UnknownRegion(format!("#{}", region.0)))
    }
}

fn store(table: &mut MemoryTable, row: u32, col: u32, value: CellContent) {
    if value.is_empty() {
        table.cells.remove(&(row, col));
    } else {
        table.cells.insert((row, col), value);
    }
}

impl GridSink for MemoryGrid {
    fn create_region(&mut self, id: &str, _rows: u32, _cols: u32) -> Result<RegionHandle> {
        if self.table(id).is_some() {
            return Err(Error::DuplicateRegion(id.to_string()));
        }
        self.tables.push(MemoryTable {
            name: id.to_string(),
            ..MemoryTable::default()
        });
        Ok(RegionHandle(self.tables.len() - 1))
    }

    fn region(&self, id: &str) -> Option<RegionHandle> {
        self.tables.iter().position(|t| t.name == id).map(RegionHandle)
    }

    fn write_cell(
        &mut self,
        region: RegionHandle,
        row: u32,
        col: u32,
        value: CellContent,
    ) -> Result<()> {
        let table = self.table_mut(region)?;
        store(table, row, col, value);
        Ok(())
    }

    fn constrain_to_list(&mut self, cell: &CellRef, source: &RangeRef) -> Result<()> {
        let region = self
            .region(&cell.table)
            .ok_or_else(|| Error::UnknownRegion(cell.table.clone()))?;
        let table = self.table_mut(region)?;
        table.list_constraints.push((cell.clone(), source.clone()));
        Ok(())
    }

    fn set_region_visibility(&mut self, region: RegionHandle, hidden: bool) -> Result<()> {
        self.table_mut(region)?.hidden = hidden;
        Ok(())
    }
}
