pub mod csv;
pub mod xlsx;

use std::path::Path;

use anyhow::Result;

use crate::usecase::ports::source::WorkbookSource;

/// Picks a source by file extension; everything but `.csv` goes to calamine.
pub fn open_workbook_source(path: &Path) -> Result<Box<dyn WorkbookSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "csv" {
        Ok(Box::new(self::csv::CsvSource::open(path)?))
    } else {
        Ok(Box::new(self::xlsx::CalamineSource::open(path)?))
    }
}
