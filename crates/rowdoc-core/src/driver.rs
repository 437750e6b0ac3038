use crate::{async_trait, RecordStream, Write};

use std::fmt::Debug;

/// Runs a query and streams back its rows.
#[async_trait]
pub trait Source: Debug + Send + Sync + 'static {
    /// Execute `query` and return its results.
    ///
    /// Records are consumed once, in the order the source yields them.
    async fn query(&self, query: &str) -> crate::Result<RecordStream>;
}

/// Accepts document writes.
///
/// Batching, quota handling, retries and durability are the sink's concern.
/// A sink may buffer writes until [`Sink::flush`].
#[async_trait]
pub trait Sink: Debug + Send {
    /// Hand a batch of writes to the sink.
    async fn write(&mut self, writes: Vec<Write>) -> crate::Result<()>;

    /// Push any buffered writes through. Called once after the last batch.
    async fn flush(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: Source + ?Sized> Source for Box<T> {
    async fn query(&self, query: &str) -> crate::Result<RecordStream> {
        (**self).query(query).await
    }
}

#[async_trait]
impl<T: Sink + ?Sized> Sink for Box<T> {
    async fn write(&mut self, writes: Vec<Write>) -> crate::Result<()> {
        (**self).write(writes).await
    }

    async fn flush(&mut self) -> crate::Result<()> {
        (**self).flush().await
    }
}
