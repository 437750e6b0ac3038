mod value;

use rowdoc_core::{Error, Record, RecordStream, Result, Source};
use tokio_postgres::{tls::MakeTlsConnect, Client, Config, Row, Socket};
use tokio_stream::StreamExt;
use url::Url;

#[derive(Debug)]
pub struct PostgreSQL {
    /// The PostgreSQL client.
    client: Client,
}

impl PostgreSQL {
    /// Initialize a rowdoc PostgreSQL source using an initialized connection.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to a PostgreSQL database using a connection string.
    pub async fn connect(url: &str) -> Result<Self> {
        let config = config_from_url(url)?;
        Self::connect_with_config(config, tokio_postgres::NoTls).await
    }

    /// Connects to a PostgreSQL database using a [`tokio_postgres::Config`].
    pub async fn connect_with_config<T>(config: Config, tls: T) -> Result<Self>
    where
        T: MakeTlsConnect<Socket> + 'static,
        T::Stream: Send,
    {
        let (client, connection) = config.connect(tls).await.map_err(Error::driver)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgresql connection error: {e}");
            }
        });

        Ok(Self::new(client))
    }
}

impl From<Client> for PostgreSQL {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

#[rowdoc_core::async_trait]
impl Source for PostgreSQL {
    async fn query(&self, query: &str) -> Result<RecordStream> {
        log::debug!("executing query; sql={query}");

        let rows = self
            .client
            .query_raw(query, Vec::<String>::new())
            .await
            .map_err(Error::driver)?;

        let records = async_stream::try_stream! {
            tokio::pin!(rows);

            while let Some(row) = rows.next().await {
                let row = row.map_err(Error::driver)?;
                yield row_to_record(&row)?;
            }
        };

        Ok(RecordStream::from_stream(records))
    }
}

fn row_to_record(row: &Row) -> Result<Record> {
    let mut record = Record::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        let value = value::postgres_to_rowdoc(index, row, column.type_()).map_err(|err| {
            err.context(rowdoc_core::err!(
                "failed to read column; column={}; type={}",
                column.name(),
                column.type_()
            ))
        })?;
        record.insert(column.name(), value);
    }

    Ok(record)
}

/// Parses a `postgresql://` connection URL.
fn config_from_url(url: &str) -> Result<Config> {
    let url = Url::parse(url)?;

    if !matches!(url.scheme(), "postgresql" | "postgres") {
        return Err(Error::invalid_connection_url(format!(
            "connection URL does not have a `postgresql` scheme; url={url}"
        )));
    }

    let host = url.host_str().ok_or_else(|| {
        Error::invalid_connection_url(format!("missing host in connection URL; url={url}"))
    })?;

    let dbname = url.path().trim_start_matches('/');

    if dbname.is_empty() {
        return Err(Error::invalid_connection_url(format!(
            "no database specified - missing path in connection URL; url={url}"
        )));
    }

    let mut config = Config::new();
    config.host(host);
    config.dbname(dbname);

    if let Some(port) = url.port() {
        config.port(port);
    }

    if !url.username().is_empty() {
        config.user(url.username());
    }

    if let Some(password) = url.password() {
        config.password(password);
    }

    Ok(config)
}
