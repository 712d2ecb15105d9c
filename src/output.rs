//! Naming and saving generated job sheets.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::info;

use crate::{
    error::{AddContext, Error},
    job::JobRecord,
    normalize,
};

/// A finished job sheet document.
#[derive(Debug, Clone)]
pub struct JobSheetPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Pages assembled before rasterization.
    pub logical_pages: usize,
    /// Pages in the written document. Never fewer than `logical_pages`.
    pub physical_pages: usize,
}

impl JobSheetPdf {
    /// Write the document into `dir` under its own filename.
    ///
    /// # Returns
    /// - The path that was written
    pub fn save(&self, dir: &Path) -> Result<PathBuf, Error> {
        std::fs::create_dir_all(dir)
            .map_err(Error::from)
            .add_context(&format!("creating output directory '{}'", dir.display()))?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)
            .map_err(Error::from)
            .add_context(&format!("writing job sheet to '{}'", path.display()))?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved job sheet");
        Ok(path)
    }
}

fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `JobSheet_<id>_<YYYY-MM-DD>.pdf`.
///
/// The id is the record id, then the occurrence id, then `now` in epoch milliseconds.
///
/// # Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use jobsheet_pdf::{JobRecordBuilder, output::job_sheet_filename};
///
/// let record = JobRecordBuilder::default().id("42").build().unwrap();
/// let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
/// assert_eq!(job_sheet_filename(&record, &now), "JobSheet_42_2026-10-16.pdf");
/// ```
pub fn job_sheet_filename<Tz: TimeZone>(record: &JobRecord, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let id = normalize::job_id(record)
        .map(|id| file_safe(&id))
        .unwrap_or_else(|| now.timestamp_millis().to_string());
    format!("JobSheet_{id}_{}.pdf", now.format("%Y-%m-%d"))
}
