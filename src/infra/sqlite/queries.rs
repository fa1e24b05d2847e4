use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::config::AppConfig;
use crate::domain::entities::table_name::TableTarget;
use crate::error::{Result, SheetError, StorageContext};
use crate::infra::sqlite::schema::{
    init_db, is_reserved_name, open_connection, open_read_only, table_exists, REGISTRY_TABLE,
};
use crate::usecase::ports::repo::{RowStream, SheetTableMeta};

/// Double-quotes an identifier; workbook text never reaches SQL unquoted.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn replace_sheet_table(
    config: &AppConfig,
    target: &TableTarget,
    headers: &[String],
    rows: RowStream<'_>,
) -> Result<i64> {
    if is_reserved_name(&target.table_name) {
        return Err(SheetError::ReservedTableName(target.table_name.clone()));
    }

    init_db(config)?;
    let mut conn = open_connection(config)?;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .storage_context("failed to start ingest transaction")?;

    ensure_no_name_conflict(&tx, target)?;

    let table = quote_ident(&target.table_name);
    tx.execute(&format!("DROP TABLE IF EXISTS {table}"), [])
        .with_storage_context(|| format!("failed to drop table `{}`", target.table_name))?;

    let columns_def = headers
        .iter()
        .map(|header| format!("{} TEXT", quote_ident(header)))
        .collect::<Vec<_>>()
        .join(", ");
    let create_sql = format!("CREATE TABLE {table} ({columns_def})");
    log::debug!("create table sql: {create_sql}");
    tx.execute(&create_sql, [])
        .with_storage_context(|| format!("failed to create table `{}`", target.table_name))?;

    let column_list = headers
        .iter()
        .map(|header| quote_ident(header))
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = vec!["?"; headers.len()].join(",");
    let insert_sql = format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})");

    let mut insert_row = tx
        .prepare(&insert_sql)
        .storage_context("failed to prepare row insert")?;

    let mut row_count = 0_i64;
    for row in rows {
        let values = row?;
        insert_row
            .execute(rusqlite::params_from_iter(values.iter()))
            .with_storage_context(|| format!("failed to insert row {row_count}"))?;
        row_count += 1;
    }
    drop(insert_row);

    tx.execute(
        &format!(
            "INSERT INTO {REGISTRY_TABLE}
                 (table_name, workbook_stem, workbook_path, sheet_name, row_count, column_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(table_name) DO UPDATE SET
                 table_name = excluded.table_name,
                 workbook_stem = excluded.workbook_stem,
                 workbook_path = excluded.workbook_path,
                 sheet_name = excluded.sheet_name,
                 row_count = excluded.row_count,
                 column_count = excluded.column_count,
                 ingested_at = CURRENT_TIMESTAMP"
        ),
        params![
            target.table_name,
            target.workbook_stem,
            target.workbook_path,
            target.sheet_name,
            row_count,
            headers.len() as i64,
        ],
    )
    .storage_context("failed to record table in registry")?;

    tx.commit().storage_context("failed to commit ingest transaction")?;
    Ok(row_count)
}

fn ensure_no_name_conflict(tx: &rusqlite::Transaction<'_>, target: &TableTarget) -> Result<()> {
    let existing = tx
        .query_row(
            &format!(
                "SELECT workbook_stem, sheet_name FROM {REGISTRY_TABLE} WHERE table_name = ?1"
            ),
            [&target.table_name],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .storage_context("failed to query table registry")?;

    match existing {
        Some((stem, sheet)) if stem != target.workbook_stem || sheet != target.sheet_name => {
            Err(SheetError::TableNameConflict {
                table: target.table_name.clone(),
                existing_stem: stem,
                existing_sheet: sheet,
                stem: target.workbook_stem.clone(),
            })
        }
        _ => Ok(()),
    }
}

pub fn table_columns(config: &AppConfig, table_name: &str) -> Result<Option<Vec<String>>> {
    if is_reserved_name(table_name) {
        return Ok(None);
    }
    let Some(conn) = open_read_only(config)? else {
        return Ok(None);
    };
    if !table_exists(&conn, table_name)? {
        return Ok(None);
    }

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid ASC")
        .storage_context("failed to prepare column query")?;
    let columns = stmt
        .query_map([table_name], |row| row.get::<_, String>(0))
        .storage_context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .storage_context("failed to collect columns")?;

    Ok(Some(columns))
}

pub fn load_rows(
    config: &AppConfig,
    table_name: &str,
    columns: &[String],
) -> Result<Vec<Vec<String>>> {
    let Some(conn) = open_read_only(config)? else {
        return Err(SheetError::TableNotFound(table_name.to_string()));
    };

    let column_list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(",");
    let mut select_sql = format!("SELECT {column_list} FROM {}", quote_ident(table_name));
    if let Some(alias) = rowid_alias(columns) {
        select_sql.push_str(&format!(" ORDER BY {alias} ASC"));
    }

    let mut stmt = conn
        .prepare(&select_sql)
        .with_storage_context(|| format!("failed to prepare select on `{table_name}`"))?;
    let mut result_rows = stmt
        .query([])
        .with_storage_context(|| format!("failed to query table `{table_name}`"))?;

    let mut rows = Vec::new();
    while let Some(row) = result_rows.next().storage_context("failed to read row")? {
        let mut values = Vec::with_capacity(columns.len());
        for col_idx in 0..columns.len() {
            let value: Value = row.get(col_idx).storage_context("failed to read value")?;
            values.push(value_to_text(value));
        }
        rows.push(values);
    }

    Ok(rows)
}

/// First rowid alias not shadowed by a user column, to keep insertion order.
fn rowid_alias(columns: &[String]) -> Option<&'static str> {
    ["rowid", "_rowid_", "oid"]
        .into_iter()
        .find(|alias| !columns.iter().any(|c| c.eq_ignore_ascii_case(alias)))
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(v) => v,
        Value::Blob(v) => String::from_utf8_lossy(&v).into_owned(),
    }
}

pub fn list_tables(config: &AppConfig) -> Result<Vec<SheetTableMeta>> {
    init_db(config)?;
    let conn = open_connection(config)?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT table_name, workbook_stem, workbook_path, sheet_name,
                    row_count, column_count, ingested_at
             FROM {REGISTRY_TABLE}
             ORDER BY table_name ASC"
        ))
        .storage_context("failed to prepare registry query")?;

    let tables = stmt
        .query_map([], |row| {
            Ok(SheetTableMeta {
                table_name: row.get(0)?,
                workbook_stem: row.get(1)?,
                workbook_path: row.get(2)?,
                sheet_name: row.get(3)?,
                row_count: row.get(4)?,
                column_count: row.get(5)?,
                ingested_at: row.get(6)?,
            })
        })
        .storage_context("failed to query registry")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .storage_context("failed to collect registry rows")?;

    Ok(tables)
}

pub fn drop_table(config: &AppConfig, table_name: &str) -> Result<bool> {
    if is_reserved_name(table_name) {
        return Err(SheetError::ReservedTableName(table_name.to_string()));
    }

    init_db(config)?;
    let mut conn = open_connection(config)?;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .storage_context("failed to start drop transaction")?;

    let existed = table_exists(&tx, table_name)?;
    tx.execute(
        &format!("DROP TABLE IF EXISTS {}", quote_ident(table_name)),
        [],
    )
    .with_storage_context(|| format!("failed to drop table `{table_name}`"))?;
    tx.execute(
        &format!("DELETE FROM {REGISTRY_TABLE} WHERE table_name = ?1"),
        [table_name],
    )
    .storage_context("failed to remove table from registry")?;

    tx.commit().storage_context("failed to commit drop transaction")?;
    Ok(existed)
}
