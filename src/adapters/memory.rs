//! In-memory adapter: DatasetSource backed by an already parsed table.

use crate::ports::{DatasetError, DatasetSource, LoadedDataset, RawTable};

/// Dataset held in memory, e.g. received from another process or built in tests.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    table: RawTable,
}

impl InMemorySource {
    #[must_use]
    pub fn new(name: impl Into<String>, table: RawTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

impl DatasetSource for InMemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn load(&self) -> Result<LoadedDataset, DatasetError> {
        if self.table.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(LoadedDataset {
            table: self.table.clone(),
            fingerprint: None,
        })
    }
}
