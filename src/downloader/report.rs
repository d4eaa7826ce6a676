// Failure bookkeeping: running append-only log plus the end-of-run summary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::errors::DownloadError;
use super::models::FailureRecord;
use crate::config::FAILURE_LOG_NAME;

const COLUMNS: [&str; 4] = ["Title", "Translated Title", "Link", "Error"];

/// Shared, append-only collection of failure records for one destination folder.
///
/// Cloning is cheap; all clones append to the same list and the same log file.
/// One lock guards both, so log blocks never interleave.
#[derive(Clone)]
pub struct FailureSink {
    folder: PathBuf,
    records: Arc<Mutex<Vec<FailureRecord>>>,
}

impl FailureSink {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a record and its block in the running log.
    /// A log write failure is reported but does not drop the record.
    pub async fn record(&self, record: FailureRecord) {
        let mut records = self.records.lock().await;

        if let Err(e) = append_block(&self.folder, &record).await {
            tracing::warn!(folder = %self.folder.display(), error = %e, "could not append to failure log");
        }

        records.push(record);
    }

    /// Snapshot in insertion (completion) order
    pub async fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

/// One human-readable block of the running log
pub fn render_block(record: &FailureRecord) -> String {
    format!(
        "Title: {}\nTranslated Title: {}\nLink: {}\nError: {}\n\n",
        record.title, record.translated_title, record.link, record.error
    )
}

async fn append_block(folder: &Path, record: &FailureRecord) -> Result<(), DownloadError> {
    fs::create_dir_all(folder).await?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(folder.join(FAILURE_LOG_NAME))
        .await?;

    file.write_all(render_block(record).as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Cell text with control characters spelled out, so a multi-line error
/// stays on its row
fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    out
}

/// Render records as right-aligned columns under a `Failed Downloads:` heading
pub fn render_table(failures: &[FailureRecord]) -> String {
    let escaped: Vec<[String; 4]> = failures
        .iter()
        .map(|r| {
            [
                escape_cell(&r.title),
                escape_cell(&r.translated_title),
                escape_cell(&r.link),
                escape_cell(&r.error),
            ]
        })
        .collect();
    let rows: Vec<[&str; 4]> = escaped
        .iter()
        .map(|row| [row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()])
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str; 4]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = String::from("Failed Downloads:\n");
    out.push_str(&format_row(&COLUMNS));
    for row in &rows {
        out.push('\n');
        out.push_str(&format_row(row));
    }
    out
}

/// Overwrite the folder's failure log with the summary table.
/// Returns the written path, or `None` when there was nothing to report.
pub async fn persist(
    failures: &[FailureRecord],
    folder: &Path,
) -> Result<Option<PathBuf>, DownloadError> {
    if failures.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(folder).await?;
    let path = folder.join(FAILURE_LOG_NAME);
    fs::write(&path, render_table(failures)).await?;

    tracing::info!(path = %path.display(), count = failures.len(), "failure summary written");
    Ok(Some(path))
}
