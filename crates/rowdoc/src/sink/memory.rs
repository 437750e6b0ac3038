use rowdoc_core::{async_trait, Result, Sink, Write};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A sink that keeps every write in memory.
///
/// Clones share storage, so a clone kept by the caller observes what the
/// export wrote.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    log: Arc<Mutex<Log>>,
}

#[derive(Debug, Default)]
struct Log {
    writes: Vec<Write>,
    batch_sizes: Vec<usize>,
    flushes: usize,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write received, in arrival order.
    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    /// Size of each `write` call, in arrival order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.lock().batch_sizes.clone()
    }

    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Sink for Memory {
    async fn write(&mut self, writes: Vec<Write>) -> Result<()> {
        let mut log = self.lock();
        log.batch_sizes.push(writes.len());
        log.writes.extend(writes);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.lock().flushes += 1;
        Ok(())
    }
}
