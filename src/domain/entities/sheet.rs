use std::collections::HashMap;
use std::fmt;

use crate::domain::entities::cell::CellValue;
use crate::domain::entities::merge::{MergeIndex, MergeRegion};

/// A sheet of an opened workbook, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRef {
    pub index: u32,
    pub name: String,
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.name)
    }
}

/// The ways a caller may point at a sheet before it is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Index(u32),
    Name(String),
    Ref(SheetRef),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(index) => write!(f, "index {index}"),
            SheetSelector::Name(name) => write!(f, "name `{name}`"),
            SheetSelector::Ref(sheet) => write!(f, "sheet {sheet}"),
        }
    }
}

impl From<u32> for SheetSelector {
    fn from(value: u32) -> Self {
        SheetSelector::Index(value)
    }
}

impl From<&str> for SheetSelector {
    fn from(value: &str) -> Self {
        SheetSelector::Name(value.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(value: String) -> Self {
        SheetSelector::Name(value)
    }
}

impl From<SheetRef> for SheetSelector {
    fn from(value: SheetRef) -> Self {
        SheetSelector::Ref(value)
    }
}

/// Cell grid of one sheet, anchored at A1.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheetData {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheetData {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// What a workbook source returns for one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetContents {
    pub data: RawSheetData,
    pub merges: Vec<MergeRegion>,
}

/// A resolved sheet held in memory for display and ingestion.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub sheet: SheetRef,
    pub data: RawSheetData,
    pub merges: MergeIndex,
}

/// One input row keyed by normalized header name.
pub type Row = HashMap<String, CellValue>;
