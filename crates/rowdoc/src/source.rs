//! Query result providers.

mod memory;
pub use memory::Memory;

use rowdoc_core::{Error, Result, Source};
use url::Url;

/// Opens the source named by `url`.
///
/// `postgresql://` (or `postgres://`) URLs need the `postgresql` feature.
pub async fn connect(url: &str) -> Result<Box<dyn Source>> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "postgresql" | "postgres" => connect_postgresql(url).await,
        scheme => Err(Error::invalid_connection_url(format!(
            "unsupported source; scheme={scheme}; url={url}"
        ))),
    }
}

#[cfg(feature = "postgresql")]
async fn connect_postgresql(url: &str) -> Result<Box<dyn Source>> {
    let driver = rowdoc_driver_postgresql::PostgreSQL::connect(url).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "postgresql"))]
async fn connect_postgresql(_url: &str) -> Result<Box<dyn Source>> {
    Err(rowdoc_core::err!("`postgresql` feature not enabled"))
}
