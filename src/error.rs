use thiserror::Error;

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    NotFound,
    Conflict,
    Storage,
    Source,
    Config,
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot ingest sheet `{sheet}`: {what} is empty")]
    EmptyInput { sheet: String, what: &'static str },

    #[error("row {row} has no value for column `{column}`")]
    MissingValue { row: usize, column: String },

    #[error("table `{0}` does not exist")]
    TableNotFound(String),

    #[error("table `{0}` has no columns")]
    NoColumns(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("workbook catalog not initialized; list sheets before reading")]
    CatalogNotInitialized,

    #[error(
        "table `{table}` already holds sheet `{existing_sheet}` of workbook `{existing_stem}`, \
         refusing to overwrite it with workbook `{stem}`"
    )]
    TableNameConflict {
        table: String,
        existing_stem: String,
        existing_sheet: String,
        stem: String,
    },

    #[error("table name `{0}` is reserved by the store")]
    ReservedTableName(String),

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0:#}")]
    Source(anyhow::Error),

    #[error("unable to resolve data directory")]
    Config,
}

impl SheetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetError::EmptyInput { .. } | SheetError::MissingValue { .. } => ErrorKind::Input,
            SheetError::TableNotFound(_)
            | SheetError::NoColumns(_)
            | SheetError::SheetNotFound(_)
            | SheetError::CatalogNotInitialized => ErrorKind::NotFound,
            SheetError::TableNameConflict { .. } | SheetError::ReservedTableName(_) => {
                ErrorKind::Conflict
            }
            SheetError::Storage { .. } | SheetError::Io { .. } => ErrorKind::Storage,
            SheetError::Source(_) => ErrorKind::Source,
            SheetError::Config => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Attaches a human-readable context to a SQLite failure, mirroring
/// `anyhow::Context` for the typed error.
pub(crate) trait StorageContext<T> {
    fn storage_context(self, context: &str) -> Result<T>;

    fn with_storage_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage_context(self, context: &str) -> Result<T> {
        self.map_err(|source| SheetError::Storage {
            context: context.to_string(),
            source,
        })
    }

    fn with_storage_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| SheetError::Storage {
            context: f(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_related_variants() {
        let empty = SheetError::EmptyInput {
            sheet: "S".to_string(),
            what: "rows",
        };
        assert_eq!(empty.kind(), ErrorKind::Input);
        assert_eq!(SheetError::TableNotFound("t".into()).kind(), ErrorKind::NotFound);
        assert_eq!(SheetError::CatalogNotInitialized.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn storage_context_prefixes_message() {
        let result: rusqlite::Result<()> = Err(rusqlite::Error::InvalidQuery);
        let err = result
            .storage_context("failed to create table")
            .expect_err("error should be kept");

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(
            err.to_string().starts_with("failed to create table: "),
            "unexpected message: {err}"
        );
    }
}
