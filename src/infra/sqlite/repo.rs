use crate::config::AppConfig;
use crate::domain::entities::table_name::TableTarget;
use crate::error::Result;
use crate::infra::sqlite::queries::{
    drop_table, list_tables, load_rows, replace_sheet_table, table_columns,
};
use crate::usecase::ports::repo::{RowStream, SheetRepository, SheetTableMeta};

/// SQLite store; every call opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub config: AppConfig,
}

impl SqliteRepo {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl SheetRepository for SqliteRepo {
    fn replace_table(
        &self,
        target: &TableTarget,
        headers: &[String],
        rows: RowStream<'_>,
    ) -> Result<i64> {
        replace_sheet_table(&self.config, target, headers, rows)
    }

    fn table_columns(&self, table_name: &str) -> Result<Option<Vec<String>>> {
        table_columns(&self.config, table_name)
    }

    fn load_rows(&self, table_name: &str, columns: &[String]) -> Result<Vec<Vec<String>>> {
        load_rows(&self.config, table_name, columns)
    }

    fn list_tables(&self) -> Result<Vec<SheetTableMeta>> {
        list_tables(&self.config)
    }

    fn drop_table(&self, table_name: &str) -> Result<bool> {
        drop_table(&self.config, table_name)
    }
}
