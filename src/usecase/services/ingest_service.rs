use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::entities::cell::CellValue;
use crate::domain::entities::headers::{normalize_headers, ColumnHeaders};
use crate::domain::entities::sheet::{LoadedSheet, Row, SheetRef, SheetSelector};
use crate::domain::entities::table_name::TableTarget;
use crate::error::{Result, SheetError};
use crate::usecase::ports::events::{IngestEvent, IngestObserver};
use crate::usecase::ports::repo::{RowStream, SheetRepository};
use crate::usecase::services::catalog_service::WorkbookCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table_name: String,
    pub row_count: i64,
    pub column_count: usize,
    pub duration: Duration,
}

pub struct SheetIngestor {
    repo: Arc<dyn SheetRepository>,
    observer: Arc<dyn IngestObserver>,
}

impl SheetIngestor {
    pub fn new(repo: Arc<dyn SheetRepository>, observer: Arc<dyn IngestObserver>) -> Self {
        Self { repo, observer }
    }

    /// Replaces the table for `workbook_path` + `sheet_name` with `rows`.
    ///
    /// Rows are keyed by the normalized header names and must carry a value
    /// (possibly [`CellValue::Null`]) for every one of them.
    pub fn ingest(
        &self,
        workbook_path: &str,
        sheet_name: &str,
        raw_headers: &[CellValue],
        rows: &[Row],
    ) -> Result<IngestReport> {
        if raw_headers.is_empty() {
            return Err(self.empty_input(sheet_name, "header row"));
        }
        if rows.is_empty() {
            return Err(self.empty_input(sheet_name, "row set"));
        }

        let headers = normalize_headers(raw_headers);
        let mut stream = rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| coerce_row(&headers, row_idx, row));
        self.write(workbook_path, sheet_name, &headers, &mut stream)
    }

    /// Ingests an in-memory sheet: first row is the header row, the rest is
    /// positional data. Short rows are padded, overlong rows truncated.
    pub fn ingest_loaded(&self, workbook_path: &str, sheet: &LoadedSheet) -> Result<IngestReport> {
        let sheet_name = sheet.sheet.name.as_str();
        let Some((header_row, data_rows)) = sheet.data.rows.split_first() else {
            return Err(self.empty_input(sheet_name, "header row"));
        };
        if header_row.is_empty() {
            return Err(self.empty_input(sheet_name, "header row"));
        }
        if data_rows.is_empty() {
            return Err(self.empty_input(sheet_name, "row set"));
        }

        let headers = normalize_headers(header_row);
        let width = headers.len();
        let mut stream = data_rows.iter().map(|row| -> Result<Vec<String>> {
            Ok((0..width)
                .map(|col| row.get(col).map(CellValue::to_text).unwrap_or_default())
                .collect())
        });
        self.write(workbook_path, sheet_name, &headers, &mut stream)
    }

    /// Ingests every sheet of the catalog's open workbook. A failing sheet
    /// does not stop the others.
    pub fn ingest_workbook(
        &self,
        catalog: &mut WorkbookCatalog,
    ) -> Result<Vec<(SheetRef, Result<IngestReport>)>> {
        let workbook_path = catalog.workbook_path()?.to_string();
        let sheets = catalog.sheets()?.to_vec();

        let mut results = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            let result = match catalog.read_sheet(&SheetSelector::Ref(sheet.clone())) {
                Ok(loaded) => self.ingest_loaded(&workbook_path, &loaded),
                Err(error) => Err(self.report_failure(&sheet.name, None, error)),
            };
            results.push((sheet, result));
        }
        Ok(results)
    }

    fn write(
        &self,
        workbook_path: &str,
        sheet_name: &str,
        headers: &ColumnHeaders,
        rows: RowStream<'_>,
    ) -> Result<IngestReport> {
        let target = TableTarget::new(workbook_path, sheet_name);
        self.observer.on_event(&IngestEvent::Started {
            table_name: &target.table_name,
            sheet_name,
        });

        let started = Instant::now();
        match self.repo.replace_table(&target, headers.as_slice(), rows) {
            Ok(row_count) => {
                let duration = started.elapsed();
                self.observer.on_event(&IngestEvent::Completed {
                    table_name: &target.table_name,
                    row_count,
                    duration,
                });
                Ok(IngestReport {
                    table_name: target.table_name,
                    row_count,
                    column_count: headers.len(),
                    duration,
                })
            }
            Err(error) => Err(self.report_failure(sheet_name, Some(&target.table_name), error)),
        }
    }

    fn empty_input(&self, sheet_name: &str, what: &'static str) -> SheetError {
        let error = SheetError::EmptyInput {
            sheet: sheet_name.to_string(),
            what,
        };
        self.report_failure(sheet_name, None, error)
    }

    fn report_failure(
        &self,
        sheet_name: &str,
        table_name: Option<&str>,
        error: SheetError,
    ) -> SheetError {
        self.observer.on_event(&IngestEvent::Failed {
            sheet_name,
            table_name,
            error: &error,
        });
        error
    }
}

fn coerce_row(headers: &ColumnHeaders, row_idx: usize, row: &Row) -> Result<Vec<String>> {
    headers
        .iter()
        .map(|header| {
            row.get(header)
                .map(CellValue::to_text)
                .ok_or_else(|| SheetError::MissingValue {
                    row: row_idx,
                    column: header.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::entities::merge::MergeIndex;
    use crate::domain::entities::sheet::RawSheetData;
    use crate::usecase::ports::events::{RecordedEvent, RecordingObserver};
    use crate::usecase::ports::repo::SheetTableMeta;

    /// Collects whatever reaches `replace_table`; never touches disk.
    #[derive(Default)]
    struct MemoryRepo {
        writes: Mutex<Vec<(String, Vec<String>, Vec<Vec<String>>)>>,
    }

    impl MemoryRepo {
        fn writes(&self) -> Vec<(String, Vec<String>, Vec<Vec<String>>)> {
            self.writes.lock().expect("lock").clone()
        }
    }

    impl SheetRepository for MemoryRepo {
        fn replace_table(
            &self,
            target: &TableTarget,
            headers: &[String],
            rows: RowStream<'_>,
        ) -> Result<i64> {
            let rows = rows.collect::<Result<Vec<_>>>()?;
            let count = rows.len() as i64;
            self.writes
                .lock()
                .expect("lock")
                .push((target.table_name.clone(), headers.to_vec(), rows));
            Ok(count)
        }

        fn table_columns(&self, _table_name: &str) -> Result<Option<Vec<String>>> {
            Ok(None)
        }

        fn load_rows(&self, _table_name: &str, _columns: &[String]) -> Result<Vec<Vec<String>>> {
            Ok(Vec::new())
        }

        fn list_tables(&self) -> Result<Vec<SheetTableMeta>> {
            Ok(Vec::new())
        }

        fn drop_table(&self, _table_name: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn ingestor() -> (Arc<MemoryRepo>, Arc<RecordingObserver>, SheetIngestor) {
        let repo = Arc::new(MemoryRepo::default());
        let observer = Arc::new(RecordingObserver::default());
        let ingestor = SheetIngestor::new(repo.clone(), observer.clone());
        (repo, observer, ingestor)
    }

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn empty_input_never_reaches_storage() {
        let (repo, observer, ingestor) = ingestor();

        let err = ingestor
            .ingest("/data/book.xlsx", "S", &[], &[row(&[])])
            .expect_err("no headers");
        assert!(matches!(err, SheetError::EmptyInput { what: "header row", .. }));

        let err = ingestor
            .ingest("/data/book.xlsx", "S", &["Name".into()], &[])
            .expect_err("no rows");
        assert!(matches!(err, SheetError::EmptyInput { what: "row set", .. }));

        assert!(repo.writes().is_empty());
        assert_eq!(
            observer.events(),
            vec![
                RecordedEvent::Failed {
                    sheet_name: "S".to_string(),
                    kind: crate::error::ErrorKind::Input,
                };
                2
            ]
        );
    }

    #[test]
    fn rows_are_coerced_in_header_order() {
        let (repo, observer, ingestor) = ingestor();
        let headers = [CellValue::from("Name"), CellValue::from("Name"), CellValue::Null];
        let rows = [row(&[
            ("Column", CellValue::Null),
            ("Name_1", CellValue::from(30i64)),
            ("Name", CellValue::from("Ann")),
        ])];

        let report = ingestor
            .ingest("/data/book.xlsx", "People", &headers, &rows)
            .expect("ingest");

        assert_eq!(report.table_name, "book_People");
        assert_eq!(report.row_count, 1);
        assert_eq!(report.column_count, 3);

        let writes = repo.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, vec!["Name", "Name_1", "Column"]);
        assert_eq!(writes[0].2, vec![vec!["Ann", "30", ""]]);

        assert_eq!(
            observer.events(),
            vec![
                RecordedEvent::Started {
                    table_name: "book_People".to_string()
                },
                RecordedEvent::Completed {
                    table_name: "book_People".to_string(),
                    row_count: 1
                },
            ]
        );
    }

    #[test]
    fn missing_key_fails_with_row_and_column() {
        let (_repo, _observer, ingestor) = ingestor();
        let rows = [
            row(&[("A", CellValue::from(1i64)), ("B", CellValue::from(2i64))]),
            row(&[("A", CellValue::from(3i64))]),
        ];

        let err = ingestor
            .ingest("book.xlsx", "S", &["A".into(), "B".into()], &rows)
            .expect_err("second row lacks B");

        match err {
            SheetError::MissingValue { row, column } => {
                assert_eq!(row, 1);
                assert_eq!(column, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loaded_sheet_rows_are_padded_and_truncated() {
        let (repo, _observer, ingestor) = ingestor();
        let sheet = LoadedSheet {
            sheet: SheetRef {
                index: 0,
                name: "Grid".to_string(),
            },
            data: RawSheetData::new(vec![
                vec!["id".into(), "label".into()],
                vec![CellValue::from(1i64)],
                vec![CellValue::from(2i64), "two".into(), "extra".into()],
            ]),
            merges: MergeIndex::new(),
        };

        let report = ingestor.ingest_loaded("grid.xlsx", &sheet).expect("ingest");

        assert_eq!(report.row_count, 2);
        let writes = repo.writes();
        assert_eq!(writes[0].2, vec![vec!["1", ""], vec!["2", "two"]]);
    }

    #[test]
    fn header_only_sheet_is_empty_input() {
        let (repo, _observer, ingestor) = ingestor();
        let sheet = LoadedSheet {
            sheet: SheetRef {
                index: 0,
                name: "Header".to_string(),
            },
            data: RawSheetData::new(vec![vec!["id".into()]]),
            merges: MergeIndex::new(),
        };

        let err = ingestor.ingest_loaded("h.xlsx", &sheet).expect_err("no data rows");
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(repo.writes().is_empty());
    }
}
