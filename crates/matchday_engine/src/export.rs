use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use matchday_core::{build_feature_table, CheckpointEntry, FeatureTable, Match};
use matchday_logging::md_info;
use serde::{Deserialize, Serialize};

use crate::columnar::write_parquet;
use crate::filename::export_filename;
use crate::persist::{AtomicFileWriter, PersistError};

pub const CHECKPOINT_FILENAME: &str = "checkpoint.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    #[default]
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(format!(
                "unsupported output format {other:?} (expected csv, json or parquet)"
            )),
        }
    }
}

/// Names the dataset a batch belongs to; the export filename is built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLabel {
    pub country: String,
    pub league: String,
    pub season: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub rows: usize,
    pub columns: usize,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("nothing to export")]
    EmptyBatch,
}

/// Writes datasets and checkpoints into one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    writer: AtomicFileWriter,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn export(
        &self,
        matches: &[Match],
        label: &DatasetLabel,
        format: ExportFormat,
        at: DateTime<Utc>,
    ) -> Result<ExportSummary, ExportError> {
        if matches.is_empty() {
            return Err(ExportError::EmptyBatch);
        }
        md_info!("Exporting {} matches to {}", matches.len(), format);

        let filename = export_filename(
            &label.country,
            &label.league,
            &label.season,
            at,
            format.extension(),
        );
        let (content, columns) = match format {
            ExportFormat::Csv => {
                let table = build_feature_table(matches);
                let mut buffer = Vec::new();
                write_csv(&mut buffer, &table)?;
                (buffer, table.columns().len())
            }
            ExportFormat::Json => (render_json(matches)?.into_bytes(), 0),
            ExportFormat::Parquet => {
                let table = build_feature_table(matches);
                (write_parquet(&table)?, table.columns().len())
            }
        };
        let path = self.writer.write(&filename, content)?;
        md_info!("Exported to: {}", path.display());

        Ok(ExportSummary {
            format,
            rows: matches.len(),
            columns,
            path,
        })
    }

    pub fn write_checkpoint(&self, entries: &[CheckpointEntry]) -> Result<PathBuf, ExportError> {
        md_info!("Saving checkpoint with {} matches", entries.len());
        let json = serde_json::to_string_pretty(entries)?;
        Ok(self.writer.write(CHECKPOINT_FILENAME, json)?)
    }

    /// Previously checkpointed entries; a missing file is an empty checkpoint.
    pub fn read_checkpoint(&self) -> Result<Vec<CheckpointEntry>, ExportError> {
        let path = self.output_dir().join(CHECKPOINT_FILENAME);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Header from the table's columns, one line per row, absent values as empty
/// cells. Quoting follows RFC 4180.
pub fn write_csv<W: Write>(mut w: W, table: &FeatureTable) -> io::Result<()> {
    write_row(&mut w, table.columns().iter().map(String::as_str))?;
    for row in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|column| row.get(column).to_string())
            .collect();
        write_row(&mut w, cells.iter().map(String::as_str))?;
    }
    w.flush()
}

fn write_row<'a, W: Write>(w: &mut W, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
    for (idx, cell) in cells.enumerate() {
        if idx > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

fn needs_quotes(cell: &str) -> bool {
    cell.contains([',', '"', '\n', '\r'])
}

/// Pretty-printed array of match documents, dated matches first in date order.
pub fn render_json(matches: &[Match]) -> Result<String, serde_json::Error> {
    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by_key(|record| (record.date.is_none(), record.date));
    serde_json::to_string_pretty(&ordered)
}
