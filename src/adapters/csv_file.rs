//! CSV adapter: Implementation of DatasetSource for delimited text files.
//!
//! Historical exports use either `,` or `;` as the delimiter. The comma is tried
//! first; when it yields fewer than two columns the file is re-read with `;`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::ports::{DatasetError, DatasetSource, LoadedDataset, RawTable};

/// Delimiters attempted, in order.
const DELIMITERS: [u8; 2] = [b',', b';'];

/// Dataset stored as a delimited text file.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn parse_with(bytes: &[u8], delimiter: u8) -> Result<RawTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DatasetError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DatasetError::Parse(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Parse delimited bytes, falling back to `;` when `,` yields a single column.
///
/// # Errors
/// Returns `DatasetError::Parse` if no delimiter produces at least two columns.
pub fn parse_delimited(bytes: &[u8]) -> Result<RawTable, DatasetError> {
    let mut last_width = 0;
    for delimiter in DELIMITERS {
        let table = parse_with(bytes, delimiter)?;
        if table.headers.len() >= 2 {
            tracing::debug!(
                "Parsed dataset with delimiter {:?}: {} columns, {} rows",
                delimiter as char,
                table.headers.len(),
                table.len()
            );
            return Ok(table);
        }
        last_width = table.headers.len();
    }
    Err(DatasetError::Parse(format!(
        "expected at least two columns, found {last_width}"
    )))
}

impl DatasetSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> Result<LoadedDataset, DatasetError> {
        if !self.path.is_file() {
            return Err(DatasetError::NotFound(self.path.display().to_string()));
        }

        let bytes = std::fs::read(&self.path)?;
        let table = parse_delimited(&bytes)?;
        if table.is_empty() {
            return Err(DatasetError::Empty);
        }

        Ok(LoadedDataset {
            table,
            fingerprint: Some(sha256_hex(&bytes)),
        })
    }
}
