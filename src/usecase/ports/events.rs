use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ErrorKind, SheetError};

/// Progress of one sheet ingestion, as seen by a hosting application.
#[derive(Debug)]
pub enum IngestEvent<'a> {
    Started {
        table_name: &'a str,
        sheet_name: &'a str,
    },
    Completed {
        table_name: &'a str,
        row_count: i64,
        duration: Duration,
    },
    Failed {
        sheet_name: &'a str,
        table_name: Option<&'a str>,
        error: &'a SheetError,
    },
}

pub trait IngestObserver: Send + Sync {
    fn on_event(&self, event: &IngestEvent<'_>);
}

/// Forwards ingestion events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl IngestObserver for LogObserver {
    fn on_event(&self, event: &IngestEvent<'_>) {
        match event {
            IngestEvent::Started {
                table_name,
                sheet_name,
            } => log::info!("ingesting sheet `{sheet_name}` into table `{table_name}`"),
            IngestEvent::Completed {
                table_name,
                row_count,
                duration,
            } => log::info!(
                "saved {row_count} rows to table `{table_name}` in {:.4}s",
                duration.as_secs_f64()
            ),
            IngestEvent::Failed {
                sheet_name, error, ..
            } => match error.kind() {
                ErrorKind::Input => log::warn!("skipped sheet `{sheet_name}`: {error}"),
                _ => log::error!("failed to ingest sheet `{sheet_name}`: {error}"),
            },
        }
    }
}

/// Owned copy of an [`IngestEvent`], kept by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Started { table_name: String },
    Completed { table_name: String, row_count: i64 },
    Failed { sheet_name: String, kind: ErrorKind },
}

/// Keeps every event in memory; useful for hosts that render a summary later.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl IngestObserver for RecordingObserver {
    fn on_event(&self, event: &IngestEvent<'_>) {
        let recorded = match event {
            IngestEvent::Started { table_name, .. } => RecordedEvent::Started {
                table_name: table_name.to_string(),
            },
            IngestEvent::Completed {
                table_name,
                row_count,
                ..
            } => RecordedEvent::Completed {
                table_name: table_name.to_string(),
                row_count: *row_count,
            },
            IngestEvent::Failed {
                sheet_name, error, ..
            } => RecordedEvent::Failed {
                sheet_name: sheet_name.to_string(),
                kind: error.kind(),
            },
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(recorded);
        }
    }
}
