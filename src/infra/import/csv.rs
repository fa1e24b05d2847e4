use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::domain::entities::cell::CellValue;
use crate::domain::entities::sheet::{RawSheetData, SheetContents};
use crate::domain::entities::table_name::workbook_stem;
use crate::usecase::ports::source::WorkbookSource;

/// A delimited text file, exposed as a workbook with one sheet named after
/// the file stem.
pub struct CsvSource {
    path: PathBuf,
    sheet_name: String,
}

impl CsvSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("csv not found: {}", path.display());
        }
        let source_path = path.to_string_lossy();
        let sheet_name = Some(workbook_stem(&source_path))
            .filter(|name| !name.is_empty())
            .unwrap_or("dataset")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            sheet_name,
        })
    }
}

impl WorkbookSource for CsvSource {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet_name.clone()]
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetContents> {
        if name != self.sheet_name {
            bail!("sheet not found in csv: {name}");
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open csv: {}", self.path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("failed to parse csv record")?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            CellValue::Null
                        } else {
                            CellValue::Text(field.to_string())
                        }
                    })
                    .collect::<Vec<_>>(),
            );
        }

        let mut data = RawSheetData::new(rows);
        let width = data.width();
        for row in &mut data.rows {
            row.resize(width, CellValue::Null);
        }

        Ok(SheetContents {
            data,
            merges: Vec::new(),
        })
    }
}
