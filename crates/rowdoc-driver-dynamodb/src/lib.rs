mod item;

use rowdoc_core::{async_trait, Error, Result, Sink, Write};

use aws_sdk_dynamodb::{
    types::{PutRequest, WriteRequest},
    Client,
};
use std::{collections::HashMap, fmt, time::Duration};
use url::Url;

/// Requests of one `BatchWriteItem` call, by table.
type RequestItems = HashMap<String, Vec<WriteRequest>>;

/// Most items one `BatchWriteItem` call accepts.
pub const MAX_BATCH_ITEMS: usize = 25;

/// Attribute holding the document path when the URL names none. The document
/// store reserves `__name__`, so no exported column can take it.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "__name__";

/// Calls made for one chunk before unprocessed items become an error.
const MAX_ATTEMPTS: u32 = 8;

const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// Writes documents as items of one DynamoDB table.
///
/// Each document becomes a full item replace keyed by its path. Writes are
/// buffered and sent in chunks of [`MAX_BATCH_ITEMS`].
#[derive(Debug)]
pub struct DynamoDb {
    /// Handle to the AWS SDK client
    client: Box<dyn BatchWrite>,

    table: String,

    /// Attribute the document path is stored under.
    key: String,

    pending: Vec<WriteRequest>,
}

impl DynamoDb {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self::with_client(Box::new(client), table)
    }

    fn with_client(client: Box<dyn BatchWrite>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            key: DEFAULT_KEY_ATTRIBUTE.to_string(),
            pending: vec![],
        }
    }

    /// Set the attribute the document path is stored under.
    pub fn key_attribute(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Connects using a `dynamodb://[host[:port]]/<table>[?key=<attr>]` URL.
    ///
    /// With a host, requests go to that endpoint with test credentials (for
    /// local emulators). Without one, region and credentials come from the
    /// standard AWS environment.
    pub async fn connect(url: &str) -> Result<Self> {
        let target = Target::from_url(url)?;

        use aws_config::BehaviorVersion;
        use aws_sdk_dynamodb::config::Credentials;

        let mut aws_config = aws_config::defaults(BehaviorVersion::latest());

        if let Some(endpoint_url) = &target.endpoint_url {
            aws_config = aws_config
                .region("us-east-1")
                .credentials_provider(Credentials::for_tests())
                .endpoint_url(endpoint_url);
        }

        let sdk_config = aws_config.load().await;
        let client = Client::new(&sdk_config);

        Ok(Self::new(client, target.table).key_attribute(target.key))
    }

    async fn send(&self, requests: Vec<WriteRequest>) -> Result<()> {
        let mut request_items = HashMap::from([(self.table.clone(), requests)]);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let unprocessed = self.client.batch_write(request_items).await.map_err(|err| {
                err.context(rowdoc_core::err!("batch write failed; table={}", self.table))
            })?;

            let remaining: usize = unprocessed.values().map(Vec::len).sum();

            if remaining == 0 {
                return Ok(());
            }

            if attempt >= MAX_ATTEMPTS {
                rowdoc_core::bail!(
                    "{remaining} items still unprocessed after {attempt} attempts; table={}",
                    self.table
                );
            }

            let delay = backoff(attempt);
            log::warn!(
                "retrying unprocessed items; table={}; remaining={remaining}; delay={delay:?}",
                self.table
            );
            tokio::time::sleep(delay).await;

            request_items = unprocessed;
        }
    }
}

#[async_trait]
impl Sink for DynamoDb {
    async fn write(&mut self, writes: Vec<Write>) -> Result<()> {
        for write in writes {
            let item = item::document_to_item(write.into_document(), &self.key)?;

            self.pending.push(
                WriteRequest::builder()
                    .put_request(
                        PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .map_err(Error::driver)?,
                    )
                    .build(),
            );
        }

        while self.pending.len() >= MAX_BATCH_ITEMS {
            let chunk = self.pending.drain(..MAX_BATCH_ITEMS).collect();
            self.send(chunk).await?;
        }

        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            let chunk = std::mem::take(&mut self.pending);
            self.send(chunk).await?;
        }

        Ok(())
    }
}

/// The `BatchWriteItem` call, returning the items left unprocessed.
#[async_trait]
trait BatchWrite: fmt::Debug + Send + Sync {
    async fn batch_write(&self, request_items: RequestItems) -> Result<RequestItems>;
}

#[async_trait]
impl BatchWrite for Client {
    async fn batch_write(&self, request_items: RequestItems) -> Result<RequestItems> {
        let output = self
            .batch_write_item()
            .set_request_items(Some(request_items))
            .send()
            .await
            .map_err(Error::driver)?;

        Ok(output.unprocessed_items.unwrap_or_default())
    }
}

fn backoff(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.pow(attempt.saturating_sub(1).min(6))
}

#[derive(Debug, PartialEq)]
struct Target {
    endpoint_url: Option<String>,
    table: String,
    key: String,
}

impl Target {
    fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;

        if url.scheme() != "dynamodb" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `dynamodb` scheme; url={url}"
            )));
        }

        let endpoint_url = match url.host_str() {
            Some(host) if !host.is_empty() => {
                let mut endpoint_url = format!("http://{host}");

                if let Some(port) = url.port() {
                    endpoint_url.push_str(&format!(":{port}"));
                }

                Some(endpoint_url)
            }
            _ => None,
        };

        let table = url.path().trim_matches('/');

        if table.is_empty() || table.contains('/') {
            return Err(Error::invalid_connection_url(format!(
                "expected the table name as the only path segment; url={url}"
            )));
        }

        let key = url
            .query_pairs()
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| DEFAULT_KEY_ATTRIBUTE.to_string());

        Ok(Self {
            endpoint_url,
            table: table.to_string(),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowdoc_core::{DocumentPath, Fields};
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    /// Records the size of every call and leaves the scripted number of
    /// items unprocessed.
    #[derive(Debug, Clone, Default)]
    struct Recorder {
        state: Arc<Mutex<RecorderState>>,
    }

    #[derive(Debug, Default)]
    struct RecorderState {
        calls: Vec<usize>,
        unprocessed: VecDeque<usize>,
        always_unprocessed: Option<usize>,
    }

    impl Recorder {
        fn leaving_unprocessed(counts: impl IntoIterator<Item = usize>) -> Self {
            let recorder = Self::default();
            recorder.state.lock().unwrap().unprocessed = counts.into_iter().collect();
            recorder
        }

        fn never_finishing() -> Self {
            let recorder = Self::default();
            recorder.state.lock().unwrap().always_unprocessed = Some(1);
            recorder
        }

        fn calls(&self) -> Vec<usize> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    #[async_trait]
    impl BatchWrite for Recorder {
        async fn batch_write(&self, mut request_items: RequestItems) -> Result<RequestItems> {
            let mut state = self.state.lock().unwrap();
            let requests = request_items.remove("documents").unwrap();
            assert!(request_items.is_empty());
            assert!(requests.len() <= MAX_BATCH_ITEMS);

            state.calls.push(requests.len());

            let leave = state
                .unprocessed
                .pop_front()
                .or(state.always_unprocessed)
                .unwrap_or(0)
                .min(requests.len());

            let mut unprocessed = RequestItems::new();
            if leave > 0 {
                let split = requests.len() - leave;
                unprocessed.insert("documents".to_string(), requests[split..].to_vec());
            }
            Ok(unprocessed)
        }
    }

    fn sink(recorder: &Recorder) -> DynamoDb {
        DynamoDb::with_client(Box::new(recorder.clone()), "documents")
    }

    fn writes(range: std::ops::Range<usize>) -> Vec<Write> {
        range
            .map(|i| Write::update(DocumentPath::from(format!("runs/r/output{i}")), Fields::new()))
            .collect()
    }

    #[tokio::test]
    async fn full_chunks_are_sent_and_the_rest_waits_for_flush() {
        let recorder = Recorder::default();
        let mut sink = sink(&recorder);

        sink.write(writes(0..60)).await.unwrap();
        assert_eq!(recorder.calls(), [25, 25]);

        sink.flush().await.unwrap();
        assert_eq!(recorder.calls(), [25, 25, 10]);
    }

    #[tokio::test]
    async fn short_writes_carry_over_to_the_next_call() {
        let recorder = Recorder::default();
        let mut sink = sink(&recorder);

        sink.write(writes(0..10)).await.unwrap();
        assert!(recorder.calls().is_empty());

        sink.write(writes(10..30)).await.unwrap();
        assert_eq!(recorder.calls(), [25]);

        sink.flush().await.unwrap();
        assert_eq!(recorder.calls(), [25, 5]);
    }

    #[tokio::test]
    async fn flush_with_nothing_pending_sends_nothing() {
        let recorder = Recorder::default();
        let mut sink = sink(&recorder);

        sink.flush().await.unwrap();
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unprocessed_items_are_resent() {
        let recorder = Recorder::leaving_unprocessed([3, 1]);
        let mut sink = sink(&recorder);

        sink.write(writes(0..25)).await.unwrap();
        assert_eq!(recorder.calls(), [25, 3, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let recorder = Recorder::never_finishing();
        let mut sink = sink(&recorder);

        sink.write(writes(0..3)).await.unwrap();
        let err = sink.flush().await.unwrap_err();

        assert_eq!(recorder.calls().len(), MAX_ATTEMPTS as usize);
        assert_eq!(
            err.to_string(),
            "1 items still unprocessed after 8 attempts; table=documents"
        );
    }

    #[derive(Debug)]
    struct Unavailable;

    #[async_trait]
    impl BatchWrite for Unavailable {
        async fn batch_write(&self, _request_items: RequestItems) -> Result<RequestItems> {
            Err(Error::driver(std::io::Error::other("service unavailable")))
        }
    }

    #[tokio::test]
    async fn client_errors_name_the_table() {
        let mut sink = DynamoDb::with_client(Box::new(Unavailable), "documents");

        sink.write(writes(0..1)).await.unwrap();
        let err = sink.flush().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "batch write failed; table=documents: service unavailable"
        );
    }

    #[tokio::test]
    async fn clashing_field_fails_the_write() {
        let recorder = Recorder::default();
        let mut sink = sink(&recorder);

        let mut fields = Fields::new();
        fields.insert(DEFAULT_KEY_ATTRIBUTE.to_string(), "x".into());

        let err = sink
            .write(vec![Write::update(DocumentPath::from("runs/r/outputx"), fields)])
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn target_with_local_endpoint() {
        let target = Target::from_url("dynamodb://localhost:8000/documents").unwrap();

        assert_eq!(
            target,
            Target {
                endpoint_url: Some("http://localhost:8000".to_string()),
                table: "documents".to_string(),
                key: DEFAULT_KEY_ATTRIBUTE.to_string(),
            }
        );
    }

    #[test]
    fn target_without_host_uses_environment() {
        let target = Target::from_url("dynamodb:///documents?key=path").unwrap();

        assert_eq!(target.endpoint_url, None);
        assert_eq!(target.table, "documents");
        assert_eq!(target.key, "path");
    }

    #[test]
    fn target_requires_table() {
        let err = Target::from_url("dynamodb://localhost:8000").unwrap_err();
        assert!(err.is_invalid_connection_url());
    }

    #[test]
    fn target_rejects_other_scheme() {
        let err = Target::from_url("postgresql://localhost/documents").unwrap_err();
        assert!(err.is_invalid_connection_url());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff(1), Duration::from_millis(50));
        assert_eq!(backoff(2), Duration::from_millis(100));
        assert_eq!(backoff(7), Duration::from_millis(3200));
        assert_eq!(backoff(20), Duration::from_millis(3200));
    }
}
