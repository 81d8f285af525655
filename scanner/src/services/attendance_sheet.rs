//! CSV attendance sheet
//!
//! Append-only table with a `name,phone,timestamp,status` header. The same
//! file is read back at session start as the registry of phones that have
//! already checked in.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use shared::component_debug;
use shared::{AttendanceRow, ComponentId};
use crate::error::{ScannerError, ScannerResult};
use crate::traits::{AttendanceStore, RegistrySource};

/// Header row written to a new sheet
pub const SHEET_HEADER: [&str; 4] = ["name", "phone", "timestamp", "status"];

/// Column holding the phone when the sheet has no header
const DEFAULT_PHONE_COLUMN: usize = 1;

/// Attendance sheet backed by a local CSV file
pub struct CsvAttendanceSheet {
    path: PathBuf,

    /// Serializes appends so rows never interleave
    write_lock: Mutex<()>,
}

impl CsvAttendanceSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create parent directories and the header if the file is missing
    pub async fn ensure_exists(&self) -> ScannerResult<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await
    }

    async fn ensure_header(&self) -> ScannerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let is_empty = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if is_empty {
            let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
            file.write_all(format_record(&SHEET_HEADER).as_bytes()).await?;
            file.flush().await?;
        }

        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for CsvAttendanceSheet {
    async fn append_row(&self, row: &AttendanceRow) -> ScannerResult<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ScannerError::storage(format!("{}: {}", self.path.display(), e)))?;

        let fields = row.fields();
        file.write_all(format_record(&fields).as_bytes()).await?;
        file.flush().await?;

        component_debug!(ComponentId::Dispatcher, "Appended row to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl RegistrySource for CsvAttendanceSheet {
    async fn load_registered(&self) -> ScannerResult<Vec<String>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ScannerError::storage(format!("{}: {}", self.path.display(), e))),
        };

        let mut records = parse_records(&text).into_iter();
        let Some(first) = records.next() else {
            return Ok(Vec::new());
        };

        let header_column = first.iter().position(|cell| cell.trim().eq_ignore_ascii_case("phone"));
        let column = header_column.unwrap_or(DEFAULT_PHONE_COLUMN);

        // without a header the first line is data
        let data_first = header_column.is_none().then_some(first);

        Ok(data_first
            .into_iter()
            .chain(records)
            .filter_map(|mut record| (column < record.len()).then(|| record.swap_remove(column)))
            .collect())
    }
}

/// Quote a field when it contains a separator, a quote or a line break
fn escape_field(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One CSV line including the trailing newline
fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields.iter().map(|f| escape_field(f.as_ref())).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Parse CSV text into records, honouring quoted fields
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
