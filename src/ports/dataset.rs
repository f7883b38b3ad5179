//! Dataset port: Trait for loading the historical population table.
//!
//! This trait abstracts where the raw table comes from (CSV file, memory, ...)
//! from the normalizer and training code.

/// Errors raised while locating or parsing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    #[error("Dataset has no data rows")]
    Empty,

    #[error("Required column missing: {0}")]
    MissingColumn(&'static str),
}

/// A raw table of string cells with trimmed header names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table, trimming header names.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }

    /// Position of a column by exact (trimmed) name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value; short rows read as empty cells.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A loaded table together with a fingerprint of its source bytes.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub table: RawTable,
    /// Hex SHA-256 of the source, when the source has a byte representation
    pub fingerprint: Option<String>,
}

/// Trait for historical dataset sources.
pub trait DatasetSource: Send + Sync {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Load the raw table.
    ///
    /// # Errors
    /// Returns `DatasetError` if the source is missing or cannot be parsed.
    fn load(&self) -> Result<LoadedDataset, DatasetError>;
}
