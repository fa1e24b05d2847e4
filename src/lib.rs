//! Spreadsheet sheets ingested into SQLite tables and read back for display.
//!
//! Workbooks are opened through a [`WorkbookCatalog`], ingested with a
//! [`SheetIngestor`] and read back with a [`SheetReader`]. Merged-cell layout
//! lives in a [`MergeIndex`] next to the loaded cell grid.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod usecase;

pub use config::AppConfig;
pub use domain::entities::cell::CellValue;
pub use domain::entities::headers::{normalize_headers, ColumnHeaders};
pub use domain::entities::merge::{CellRole, MergeError, MergeIndex, MergeRegion, Span};
pub use domain::entities::sheet::{LoadedSheet, Row, SheetRef, SheetSelector};
pub use domain::entities::table_name::table_name;
pub use error::{ErrorKind, Result, SheetError};
pub use infra::sqlite::repo::SqliteRepo;
pub use usecase::ports::events::{IngestEvent, IngestObserver, LogObserver};
pub use usecase::services::catalog_service::WorkbookCatalog;
pub use usecase::services::ingest_service::{IngestReport, SheetIngestor};
pub use usecase::services::read_service::{SheetReader, SheetTable};
