mod utility;

use anyhow::Result;
use clap::Parser;
use rowdoc::{Export, OutputLayout, StoreDefaults, Summary};

/// Export the rows of a SQL query as documents.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "rowdoc")]
#[command(about = "Export query results to a document store, one document per row")]
#[command(version)]
pub struct Cli {
    /// SQL query whose rows become documents
    #[arg(long, env = "ROWDOC_QUERY")]
    pub query: String,

    /// Collection the documents are written under
    #[arg(long)]
    pub collection: String,

    /// Identifier namespacing this run's documents within the collection
    #[arg(long)]
    pub run_id: String,

    /// Target database; the default database is used when omitted or empty
    #[arg(long)]
    pub database_id: Option<String>,

    /// Project owning the target database
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project_id: Option<String>,

    /// Database used when `--database-id` is not given
    #[arg(long, env = "FIRESTORE_DATABASE", default_value = rowdoc::path::DEFAULT_DATABASE_ID)]
    pub default_database_id: String,

    /// Connection URL of the source, e.g. `postgresql://user@host/db`
    #[arg(long, env = "ROWDOC_SOURCE_URL")]
    pub source: String,

    /// Destination URL: `dynamodb://host:port/table`, `file:///path`, or `stdout:`
    #[arg(long, env = "ROWDOC_SINK_URL", default_value = "stdout:")]
    pub sink: String,

    /// Writes handed to the sink per call
    #[arg(long, default_value_t = rowdoc::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Write documents under `output/<id>` instead of `output<id>`
    #[arg(long)]
    pub nested_output_ids: bool,
}

impl Cli {
    /// Resolve the configured export. Fails on configuration errors, before
    /// anything is connected.
    pub fn export(&self) -> rowdoc::Result<Export> {
        let mut defaults = StoreDefaults::new().database_id(&self.default_database_id);

        if let Some(project_id) = &self.project_id {
            defaults = defaults.project_id(project_id);
        }

        let layout = if self.nested_output_ids {
            OutputLayout::Nested
        } else {
            OutputLayout::Concatenated
        };

        Export::builder()
            .query(&self.query)
            .collection(&self.collection)
            .run_id(&self.run_id)
            .database_id(self.database_id.clone())
            .layout(layout)
            .defaults(defaults)
            .batch_size(self.batch_size)
            .build()
    }

    pub async fn run(self) -> Result<Summary> {
        let export = self.export()?;

        log::info!(
            "connecting; source={}; sink={}",
            utility::redact_url_password(&self.source),
            utility::redact_url_password(&self.sink)
        );

        let source = rowdoc::source::connect(&self.source).await?;
        let mut sink = rowdoc::sink::connect(&self.sink).await?;

        Ok(export.run(&source, &mut sink).await?)
    }
}
