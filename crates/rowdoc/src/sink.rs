//! Document write destinations.

mod json_lines;
pub use json_lines::JsonLines;

mod memory;
pub use memory::Memory;

use rowdoc_core::{Error, Result, Sink};
use url::Url;

/// Opens the sink named by `url`.
///
/// | scheme     | sink                                         |
/// |------------|----------------------------------------------|
/// | `dynamodb` | DynamoDB table (`dynamodb` feature)          |
/// | `file`     | JSON lines written to the file (truncated)   |
/// | `stdout`   | JSON lines written to standard output        |
pub async fn connect(url: &str) -> Result<Box<dyn Sink>> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "dynamodb" => connect_dynamodb(url).await,
        "file" => {
            let path = parsed.to_file_path().map_err(|_| {
                Error::invalid_connection_url(format!("not a local file path; url={url}"))
            })?;
            Ok(Box::new(JsonLines::create(path).await?))
        }
        "stdout" => Ok(Box::new(JsonLines::stdout())),
        scheme => Err(Error::invalid_connection_url(format!(
            "unsupported sink; scheme={scheme}; url={url}"
        ))),
    }
}

#[cfg(feature = "dynamodb")]
async fn connect_dynamodb(url: &str) -> Result<Box<dyn Sink>> {
    let driver = rowdoc_driver_dynamodb::DynamoDb::connect(url).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "dynamodb"))]
async fn connect_dynamodb(_url: &str) -> Result<Box<dyn Sink>> {
    Err(rowdoc_core::err!("`dynamodb` feature not enabled"))
}
