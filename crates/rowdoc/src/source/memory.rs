use rowdoc_core::{async_trait, Record, RecordStream, Result, Source};

use std::sync::{Arc, Mutex, PoisonError};

/// A source that answers every query with the same records.
///
/// Clones share the log of queries received.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    records: Vec<Record>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl Memory {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
            queries: Arc::default(),
        }
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Source for Memory {
    async fn query(&self, query: &str) -> Result<RecordStream> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        Ok(RecordStream::from_vec(self.records.clone()))
    }
}
