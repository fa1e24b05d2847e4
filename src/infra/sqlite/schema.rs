use rusqlite::{Connection, OpenFlags};

use crate::config::AppConfig;
use crate::error::{Result, SheetError, StorageContext};

/// Bookkeeping table describing every ingested sheet table.
pub const REGISTRY_TABLE: &str = "_sheetbase_tables";
const SQLITE_PREFIX: &str = "sqlite_";

pub fn open_connection(config: &AppConfig) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_storage_context(|| format!("failed to open db: {}", config.db_path.display()))?;
    conn.busy_timeout(config.busy_timeout)
        .storage_context("failed to set busy timeout")?;
    Ok(conn)
}

/// Opens an existing database without write access. `None` when the file
/// has never been created, which readers treat as "no tables".
pub fn open_read_only(config: &AppConfig) -> Result<Option<Connection>> {
    if !config.db_path.exists() {
        return Ok(None);
    }
    let conn = Connection::open_with_flags(
        &config.db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_storage_context(|| format!("failed to open db: {}", config.db_path.display()))?;
    conn.busy_timeout(config.busy_timeout)
        .storage_context("failed to set busy timeout")?;
    Ok(Some(conn))
}

pub fn init_db(config: &AppConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| SheetError::Io {
                context: format!("failed to create parent dir: {}", parent.display()),
                source,
            })?;
        }
    }

    let conn = open_connection(config)?;

    // WAL lets readers proceed while another connection ingests.
    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
        .storage_context("failed to enable write-ahead logging")?;

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {REGISTRY_TABLE} (
            table_name    TEXT PRIMARY KEY COLLATE NOCASE,
            workbook_stem TEXT NOT NULL,
            workbook_path TEXT NOT NULL,
            sheet_name    TEXT NOT NULL,
            row_count     INTEGER NOT NULL,
            column_count  INTEGER NOT NULL,
            ingested_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "
    ))
    .storage_context("failed to initialize schema")?;

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table_name],
            |row| row.get(0),
        )
        .storage_context("failed to look up table")?;
    Ok(count > 0)
}

/// Names no sheet table may take: the registry itself and SQLite's own
/// `sqlite_` prefix, both compared ASCII case-insensitively.
pub(crate) fn is_reserved_name(table_name: &str) -> bool {
    table_name.eq_ignore_ascii_case(REGISTRY_TABLE)
        || table_name
            .get(..SQLITE_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SQLITE_PREFIX))
}
