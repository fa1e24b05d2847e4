use crate::domain::entities::table_name::TableTarget;
use crate::error::Result;

/// Rows handed to the store one at a time so a failure part-way through can
/// abort the surrounding transaction.
pub type RowStream<'a> = &'a mut dyn Iterator<Item = Result<Vec<String>>>;

pub trait SheetRepository: Send + Sync {
    /// Drops and recreates `target`'s table, inserts every streamed row and
    /// records it in the registry, all in one transaction. Returns the row count.
    fn replace_table(&self, target: &TableTarget, headers: &[String], rows: RowStream<'_>)
        -> Result<i64>;

    /// Column names in declared order, or `None` when the table is absent.
    fn table_columns(&self, table_name: &str) -> Result<Option<Vec<String>>>;
    fn load_rows(&self, table_name: &str, columns: &[String]) -> Result<Vec<Vec<String>>>;

    fn list_tables(&self) -> Result<Vec<SheetTableMeta>>;
    fn drop_table(&self, table_name: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTableMeta {
    pub table_name: String,
    pub workbook_stem: String,
    pub workbook_path: String,
    pub sheet_name: String,
    pub row_count: i64,
    pub column_count: i64,
    pub ingested_at: String,
}
