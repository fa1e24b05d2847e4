use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::table_name::table_name;
use crate::error::{Result, SheetError};
use crate::usecase::ports::repo::{SheetRepository, SheetTableMeta};

/// A persisted sheet read back from the store, columns in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTable {
    pub table_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl SheetTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows as positional vectors following `headers`, for grid rendering.
    pub fn grid(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .map(|header| row.get(header).map(String::as_str).unwrap_or(""))
                    .collect()
            })
            .collect()
    }
}

pub struct SheetReader {
    repo: Arc<dyn SheetRepository>,
}

impl SheetReader {
    pub fn new(repo: Arc<dyn SheetRepository>) -> Self {
        Self { repo }
    }

    pub fn read(&self, workbook_path: &str, sheet_name: &str) -> Result<SheetTable> {
        let table_name = table_name(workbook_path, sheet_name);
        let headers = self
            .repo
            .table_columns(&table_name)?
            .ok_or_else(|| SheetError::TableNotFound(table_name.clone()))?;
        if headers.is_empty() {
            return Err(SheetError::NoColumns(table_name));
        }

        let rows = self
            .repo
            .load_rows(&table_name, &headers)?
            .into_iter()
            .map(|values| headers.iter().cloned().zip(values).collect())
            .collect();

        Ok(SheetTable {
            table_name,
            headers,
            rows,
        })
    }

    pub fn list_tables(&self) -> Result<Vec<SheetTableMeta>> {
        self.repo.list_tables()
    }

    /// Returns whether a table was actually removed.
    pub fn drop_table(&self, workbook_path: &str, sheet_name: &str) -> Result<bool> {
        let table_name = table_name(workbook_path, sheet_name);
        let dropped = self.repo.drop_table(&table_name)?;
        if dropped {
            log::info!("dropped table `{table_name}`");
        }
        Ok(dropped)
    }
}
