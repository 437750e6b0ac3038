use rowdoc_core::{async_trait, Result, Sink, Write};

use std::{fmt, path::Path};
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout},
};

/// Writes each write as one line of JSON, in the document store's REST
/// shape: `{"update":{"name":"...","fields":{"id":{"stringValue":"42"}}}}`.
pub struct JsonLines<W> {
    writer: W,
}

impl<W> JsonLines<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLines<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path).await?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl JsonLines<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(tokio::io::stdout()))
    }
}

#[async_trait]
impl<W> Sink for JsonLines<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, writes: Vec<Write>) -> Result<()> {
        for write in &writes {
            let mut line = serde_json::to_vec(write)?;
            line.push(b'\n');
            self.writer.write_all(&line).await?;
        }

        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

impl<W> fmt::Debug for JsonLines<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLines").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowdoc_core::{DocumentPath, FieldValue, Fields};

    #[tokio::test]
    async fn one_line_per_write() {
        let mut fields = Fields::new();
        fields.insert("id".to_string(), FieldValue::from("1"));

        let mut sink = JsonLines::new(Vec::new());
        sink.write(vec![
            Write::update(DocumentPath::from("a"), fields),
            Write::update(DocumentPath::from("b"), Fields::new()),
        ])
        .await
        .unwrap();
        sink.flush().await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            concat!(
                r#"{"update":{"name":"a","fields":{"id":{"stringValue":"1"}}}}"#,
                "\n",
                r#"{"update":{"name":"b","fields":{}}}"#,
                "\n",
            )
        );
    }
}
