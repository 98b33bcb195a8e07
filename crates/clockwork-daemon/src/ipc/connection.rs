use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tokio::net::UnixStream;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Split a client stream into its line reader and message writer
pub fn split(stream: UnixStream) -> (RequestReader, MessageWriter) {
    let (read_half, write_half) = tokio::io::split(stream);
    (
        RequestReader {
            reader: BufReader::new(read_half),
            buffer: Vec::new(),
        },
        MessageWriter {
            writer: BufWriter::new(write_half),
        },
    )
}

pub struct RequestReader {
    reader: BufReader<ReadHalf<UnixStream>>,
    buffer: Vec<u8>,
}

impl RequestReader {
    /// Next non-blank line, without its terminator.
    ///
    /// Cancel safe: `read_until` appends partial reads to the persistent
    /// buffer, so a line split across reads survives a lost `select!`.
    pub async fn next_line(&mut self) -> Result<String> {
        loop {
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer).await?;
            if bytes_read == 0 {
                return Err(ConnectionError::Closed);
            }
            if self.buffer.last() != Some(&b'\n') {
                continue;
            }

            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                return Ok(line.to_string());
            }
        }
    }
}

pub struct MessageWriter {
    writer: BufWriter<WriteHalf<UnixStream>>,
}

impl MessageWriter {
    /// Write one message as a single JSON line
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let json = serde_json::to_string(message)?;

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_reads_lines_and_skips_blanks() {
        let (client, server) = UnixStream::pair().unwrap();
        let (mut reader, _writer) = split(server);
        let (_client_read, mut client_write) = tokio::io::split(client);

        client_write
            .write_all(b"\n{\"a\":1}\n  \n{\"b\":2}")
            .await
            .unwrap();
        client_write.write_all(b"\n").await.unwrap();

        assert_eq!(reader.next_line().await.unwrap(), "{\"a\":1}");
        assert_eq!(reader.next_line().await.unwrap(), "{\"b\":2}");
    }

    #[tokio::test]
    async fn test_partial_line_survives_cancelled_read() {
        let (client, server) = UnixStream::pair().unwrap();
        let (mut reader, _writer) = split(server);
        let (_client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(b"{\"jsonrpc\":\"2.0\",").await.unwrap();
        client_write.flush().await.unwrap();

        tokio::select! {
            _ = reader.next_line() => panic!("line is not complete yet"),
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {}
        }

        client_write
            .write_all(b"\"method\":\"zone.list\",\"id\":1}\n")
            .await
            .unwrap();

        assert_eq!(
            reader.next_line().await.unwrap(),
            r#"{"jsonrpc":"2.0","method":"zone.list","id":1}"#
        );
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let (client, server) = UnixStream::pair().unwrap();
        let (mut reader, _writer) = split(server);
        drop(client);

        assert!(matches!(
            reader.next_line().await,
            Err(ConnectionError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_send_writes_one_line() {
        let (client, server) = UnixStream::pair().unwrap();
        let (_reader, mut writer) = split(server);
        let (mut client_read, _client_write) = tokio::io::split(client);

        writer.send(&json!({ "ok": true })).await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = client_read.read(&mut buf).await.unwrap();
        let text = std::str::from_utf8(&buf[..n]).unwrap();
        assert!(text.ends_with('\n'));
        let value: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["ok"], true);
    }
}
