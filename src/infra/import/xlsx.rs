use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Range, Reader, Sheets};

use crate::domain::entities::cell::CellValue;
use crate::domain::entities::merge::MergeRegion;
use crate::domain::entities::sheet::{RawSheetData, SheetContents};
use crate::usecase::ports::source::WorkbookSource;

pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(v) => CellValue::Text(v.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => cell
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(v.to_string())),
        Data::DateTimeIso(v) => cell
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(v.clone())),
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(v) => CellValue::Text(v.to_string()),
    }
}

/// Converts a calamine range into a grid anchored at A1, so row and column
/// indices line up with merge region coordinates.
pub fn range_to_grid(range: &Range<Data>) -> RawSheetData {
    let Some((row0, col0)) = range.start() else {
        return RawSheetData::default();
    };
    let (row0, col0) = (row0 as usize, col0 as usize);
    let width = col0 + range.width();

    let mut rows = Vec::with_capacity(row0 + range.height());
    rows.extend((0..row0).map(|_| vec![CellValue::Null; width]));
    for row in range.rows() {
        let mut cells = Vec::with_capacity(width);
        cells.resize(col0, CellValue::Null);
        cells.extend(row.iter().map(cell_value));
        rows.push(cells);
    }

    RawSheetData::new(rows)
}

/// Any format calamine can open: xlsx, xlsm, xlsb, xls, ods.
pub struct CalamineSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    merges_loaded: bool,
}

impl CalamineSource {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook = open_workbook_auto(path)
            .with_context(|| format!("failed to open workbook: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
            merges_loaded: false,
        })
    }

    fn merge_regions(&mut self, name: &str) -> Result<Vec<MergeRegion>> {
        match &mut self.workbook {
            Sheets::Xlsx(xlsx) => {
                if !self.merges_loaded {
                    xlsx.load_merged_regions().with_context(|| {
                        format!("failed to load merged regions: {}", self.path.display())
                    })?;
                    self.merges_loaded = true;
                }
                Ok(xlsx
                    .merged_regions_by_sheet(name)
                    .into_iter()
                    .map(|(_, _, dims)| MergeRegion::new(dims.start, dims.end))
                    .collect())
            }
            _ => {
                log::debug!(
                    "merge regions are only read from xlsx workbooks: {}",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }
}

impl WorkbookSource for CalamineSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetContents> {
        let range = self
            .workbook
            .worksheet_range(name)
            .with_context(|| format!("failed to read sheet: {name}"))?;
        let data = range_to_grid(&range);
        let merges = self.merge_regions(name)?;

        log::info!(
            "read sheet `{name}`: {} rows, {} merge regions",
            data.rows.len(),
            merges.len()
        );
        Ok(SheetContents { data, merges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn cell_value_maps_scalar_variants() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(
            cell_value(&Data::String("Ann".to_string())),
            CellValue::Text("Ann".to_string())
        );
        assert_eq!(cell_value(&Data::Int(30)), CellValue::Number(30.0));
        assert_eq!(cell_value(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(
            cell_value(&Data::Error(CellErrorType::Div0)),
            CellValue::Text("#DIV/0!".to_string())
        );
    }

    #[test]
    fn range_to_grid_pads_to_a1() {
        let mut range: Range<Data> = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::String("Name".to_string()));
        range.set_value((1, 2), Data::String("Age".to_string()));
        range.set_value((2, 1), Data::String("Ann".to_string()));
        range.set_value((2, 2), Data::Int(30));

        let grid = range_to_grid(&range);

        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(0, 0), Some(&CellValue::Null));
        assert_eq!(grid.cell(1, 0), Some(&CellValue::Null));
        assert_eq!(grid.cell(1, 1), Some(&CellValue::Text("Name".to_string())));
        assert_eq!(grid.cell(2, 2), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn empty_range_gives_empty_grid() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_grid(&range).is_empty());
    }
}
