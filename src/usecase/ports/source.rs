use anyhow::Result;

use crate::domain::entities::sheet::SheetContents;

/// Anything that can list and read the sheets of one opened workbook.
pub trait WorkbookSource: Send {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<SheetContents>;
}
