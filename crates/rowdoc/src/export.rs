use rowdoc_core::{
    id::UuidV4, map_record, Error, IdGenerator, OutputLayout, PathBuilder, Record, Result,
    RunConfig, Sink, Source, StoreDefaults, Write,
};

use std::{fmt, mem, sync::Arc};

/// Writes handed to the sink per call when not configured. Matches the
/// document store's batch-write limit.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// One configured export run: query rows, map each to a document, write.
///
/// All configuration is resolved by [`ExportBuilder::build`]. Building the
/// path for a record only draws an id, so `Export` can be shared across
/// tasks and [`Export::run`] called for several source/sink pairs.
pub struct Export {
    run: RunConfig,
    paths: PathBuilder,
    ids: Arc<dyn IdGenerator>,
    batch_size: usize,
}

/// Records read and batches written by [`Export::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub records: u64,
    pub batches: u64,
}

impl Export {
    pub fn builder() -> ExportBuilder {
        ExportBuilder::default()
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run
    }

    /// Builds the write for one record.
    pub fn to_write(&self, record: &Record) -> Write {
        Write::update(self.paths.next(&*self.ids), map_record(record))
    }

    /// Streams the query results from `source` into `sink`.
    ///
    /// Source and sink errors are returned as they are. When the source fails
    /// part way, the records read so far are still written and the sink is
    /// flushed before the error is returned.
    pub async fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<Summary>
    where
        S: Source + ?Sized,
        K: Sink + ?Sized,
    {
        log::info!(
            "starting export; collection={}; run_id={}",
            self.run.collection,
            self.run.run_id
        );

        let mut records = source.query(&self.run.query).await?;
        let mut summary = Summary::default();
        let mut batch = Vec::with_capacity(self.batch_size);

        while let Some(record) = records.next().await {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    self.drain(sink, batch, &mut summary).await;
                    return Err(err);
                }
            };

            batch.push(self.to_write(&record));
            summary.records += 1;

            if batch.len() >= self.batch_size {
                let full = mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                self.write_batch(sink, full, &mut summary).await?;
            }
        }

        if !batch.is_empty() {
            self.write_batch(sink, batch, &mut summary).await?;
        }

        sink.flush().await?;

        log::info!(
            "export finished; records={}; batches={}",
            summary.records,
            summary.batches
        );

        Ok(summary)
    }

    /// Writes and flushes what was read before a source error. Failures here
    /// are logged; the source error is the one returned.
    async fn drain<K>(&self, sink: &mut K, batch: Vec<Write>, summary: &mut Summary)
    where
        K: Sink + ?Sized,
    {
        if !batch.is_empty() {
            if let Err(err) = self.write_batch(sink, batch, summary).await {
                log::warn!("failed to write records read before the source error; error={err}");
                return;
            }
        }

        if let Err(err) = sink.flush().await {
            log::warn!("failed to flush sink after the source error; error={err}");
        }
    }

    async fn write_batch<K>(
        &self,
        sink: &mut K,
        batch: Vec<Write>,
        summary: &mut Summary,
    ) -> Result<()>
    where
        K: Sink + ?Sized,
    {
        log::debug!("writing batch; size={}", batch.len());
        sink.write(batch).await?;
        summary.batches += 1;
        Ok(())
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("run", &self.run)
            .field("paths", &self.paths)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Export`].
pub struct ExportBuilder {
    run: RunConfig,
    defaults: StoreDefaults,
    ids: Option<Arc<dyn IdGenerator>>,
    batch_size: usize,
}

impl Default for ExportBuilder {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            defaults: StoreDefaults::default(),
            ids: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ExportBuilder {
    /// Replace the whole run configuration.
    pub fn run_config(&mut self, run: RunConfig) -> &mut Self {
        self.run = run;
        self
    }

    pub fn query(&mut self, query: impl Into<String>) -> &mut Self {
        self.run.query = query.into();
        self
    }

    pub fn collection(&mut self, collection: impl Into<String>) -> &mut Self {
        self.run.collection = collection.into();
        self
    }

    pub fn run_id(&mut self, run_id: impl Into<String>) -> &mut Self {
        self.run.run_id = run_id.into();
        self
    }

    pub fn database_id(&mut self, database_id: Option<String>) -> &mut Self {
        self.run.database_id = database_id;
        self
    }

    pub fn layout(&mut self, layout: OutputLayout) -> &mut Self {
        self.run.layout = layout;
        self
    }

    pub fn defaults(&mut self, defaults: StoreDefaults) -> &mut Self {
        self.defaults = defaults;
        self
    }

    /// Set the id generator. Defaults to [`UuidV4`].
    pub fn id_generator(&mut self, ids: impl IdGenerator + 'static) -> &mut Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub fn batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = batch_size;
        self
    }

    pub fn build(&mut self) -> Result<Export> {
        if self.run.query.trim().is_empty() {
            return Err(Error::configuration("no query configured"));
        }

        if self.batch_size == 0 {
            return Err(Error::configuration("batch size must be at least 1"));
        }

        let paths = PathBuilder::new(&self.run, &self.defaults)?;

        let ids: Arc<dyn IdGenerator> = match &self.ids {
            Some(ids) => ids.clone(),
            None => Arc::new(UuidV4),
        };

        Ok(Export {
            run: self.run.clone(),
            paths,
            ids,
            batch_size: self.batch_size,
        })
    }
}

impl fmt::Debug for ExportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportBuilder")
            .field("run", &self.run)
            .field("defaults", &self.defaults)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
