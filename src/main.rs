use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use sheetbase::{
    AppConfig, CellRole, IngestEvent, IngestObserver, SheetIngestor, SheetReader, SheetSelector,
    SqliteRepo, WorkbookCatalog,
};

#[derive(Parser)]
#[command(name = "sheetbase")]
#[command(about = "Load spreadsheet sheets into SQLite tables and read them back.")]
struct Cli {
    /// SQLite database file (defaults to $SHEETBASE_DB, then the per-user data dir).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the sheets of a workbook.
    Sheets { file: PathBuf },
    /// Ingest one sheet, or every sheet when none is selected.
    Ingest {
        file: PathBuf,
        #[command(flatten)]
        sheet: SheetArg,
    },
    /// Print a previously ingested sheet.
    Show {
        file: PathBuf,
        #[arg(long)]
        sheet: String,
    },
    /// Print the merged-cell regions of a sheet.
    Merges {
        file: PathBuf,
        #[command(flatten)]
        sheet: SheetArg,
    },
    /// List every ingested table.
    Tables,
    /// Drop the table of an ingested sheet.
    Drop {
        file: PathBuf,
        #[arg(long)]
        sheet: String,
    },
}

#[derive(Args)]
struct SheetArg {
    /// Sheet name.
    #[arg(long, conflicts_with = "index")]
    sheet: Option<String>,
    /// Zero-based sheet position.
    #[arg(long)]
    index: Option<u32>,
}

impl SheetArg {
    fn selector(&self) -> Option<SheetSelector> {
        match (&self.sheet, self.index) {
            (Some(name), _) => Some(SheetSelector::from(name.as_str())),
            (None, Some(index)) => Some(SheetSelector::Index(index)),
            (None, None) => None,
        }
    }
}

/// Prints ingestion progress to stderr.
struct ConsoleObserver;

impl IngestObserver for ConsoleObserver {
    fn on_event(&self, event: &IngestEvent<'_>) {
        match event {
            IngestEvent::Started {
                table_name,
                sheet_name,
            } => eprintln!("ingesting `{sheet_name}` -> {table_name}"),
            IngestEvent::Completed {
                table_name,
                row_count,
                duration,
            } => eprintln!(
                "saved {row_count} rows to {table_name} ({:.3}s)",
                duration.as_secs_f64()
            ),
            IngestEvent::Failed {
                sheet_name, error, ..
            } => eprintln!("failed `{sheet_name}`: {error}"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config =
        AppConfig::resolve(cli.db.as_deref()).context("failed to resolve database path")?;
    let repo = Arc::new(SqliteRepo::new(config));

    match cli.command {
        Command::Sheets { file } => {
            let mut catalog = WorkbookCatalog::new();
            for sheet in catalog.list_sheets(&file)? {
                println!("{}\t{}", sheet.index, sheet.name);
            }
        }
        Command::Ingest { file, sheet } => {
            let ingestor = SheetIngestor::new(repo, Arc::new(ConsoleObserver));
            let mut catalog = open_catalog(&file)?;
            let workbook_path = file.to_string_lossy();

            match sheet.selector() {
                Some(selector) => {
                    let loaded = catalog.read_sheet(&selector)?;
                    let report = ingestor.ingest_loaded(&workbook_path, &loaded)?;
                    println!("{}\t{}", report.table_name, report.row_count);
                }
                None => {
                    let mut failed = 0;
                    for (sheet, result) in ingestor.ingest_workbook(&mut catalog)? {
                        match result {
                            Ok(report) => println!("{}\t{}", report.table_name, report.row_count),
                            Err(_) => {
                                failed += 1;
                                println!("{}\t-", sheet.name);
                            }
                        }
                    }
                    if failed > 0 {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Command::Show { file, sheet } => {
            let reader = SheetReader::new(repo);
            let table = reader.read(&file.to_string_lossy(), &sheet)?;
            println!("{}", table.headers.join("\t"));
            for row in table.grid() {
                println!("{}", row.join("\t"));
            }
        }
        Command::Merges { file, sheet } => {
            let mut catalog = open_catalog(&file)?;
            let selector = sheet.selector().unwrap_or(SheetSelector::Index(0));
            let loaded = catalog.read_sheet(&selector)?;
            for region in loaded.merges.regions() {
                let (row, col) = region.start();
                if let CellRole::Origin(span) = loaded.merges.role_at(row, col) {
                    println!("{region}\t{}x{}", span.rows, span.cols);
                }
            }
        }
        Command::Tables => {
            let reader = SheetReader::new(repo);
            for table in reader.list_tables()? {
                println!(
                    "{}\t{}\t{}\t{} rows\t{} cols\t{}",
                    table.table_name,
                    table.workbook_path,
                    table.sheet_name,
                    table.row_count,
                    table.column_count,
                    table.ingested_at
                );
            }
        }
        Command::Drop { file, sheet } => {
            let reader = SheetReader::new(repo);
            if !reader.drop_table(&file.to_string_lossy(), &sheet)? {
                eprintln!("no table for sheet `{sheet}`");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_catalog(file: &Path) -> Result<WorkbookCatalog> {
    let mut catalog = WorkbookCatalog::new();
    catalog
        .list_sheets(file)
        .with_context(|| format!("failed to open workbook: {}", file.display()))?;
    Ok(catalog)
}
