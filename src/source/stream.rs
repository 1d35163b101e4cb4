//! Stream-based replay source.
//!
//! Reads newline-delimited JSON records from an async reader and turns
//! each into an [`InboundMessage`]:
//!
//! ```json
//! {"topic": "geodata/node7/status", "payload": "2"}
//! {"topic": "geodata/node3/status", "payload": "0", "received_at": 1700000000000000000}
//! ```
//!
//! `received_at` is optional; records without it are stamped when read.
//! Lines that are not valid records are logged and skipped.

use std::path::Path;

use async_trait::async_trait;
use geowatch_types::{InboundMessage, UtcNanos};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::MessageSource;

const BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    topic: String,
    payload: String,
    #[serde(default)]
    received_at: Option<UtcNanos>,
}

impl From<ReplayRecord> for InboundMessage {
    fn from(record: ReplayRecord) -> Self {
        let received_at = record.received_at.unwrap_or_else(UtcNanos::now);
        InboundMessage::new(record.topic, record.payload, received_at)
    }
}

/// A message source that replays recorded messages from an async stream.
///
/// This source spawns a background task that reads from the provided
/// reader and hands messages over through a bounded channel, so the
/// reader is never further ahead than the channel capacity.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use geowatch_hub::{MessageSource, StreamSource};
///
/// # tokio_test::block_on(async {
/// let data = b"{\"topic\": \"geodata/node7/status\", \"payload\": \"2\"}\n";
/// let mut source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
/// let message = source.next_message().await.unwrap();
/// assert_eq!(message.payload, b"2");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<InboundMessage>,
    description: String,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(BUFFER);
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            let mut line_no = 0u64;

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, lines = line_no, "Replay finished");
                        break;
                    }
                    Ok(_) => {
                        line_no += 1;
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<ReplayRecord>(trimmed) {
                            Ok(record) => {
                                if tx.send(record.into()).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(source = %desc, line = line_no, error = %e, "Skipping invalid replay record");
                            }
                        }
                    }
                    Err(e) => {
                        warn!(source = %desc, error = %e, "Replay read error");
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("replay: {}", description),
        }
    }

    /// Replay from a file, or from stdin when `path` is `-`.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        if path == Path::new("-") {
            return Ok(Self::spawn(tokio::io::stdin(), "stdin"));
        }
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::spawn(file, &path.display().to_string()))
    }
}

#[async_trait]
impl MessageSource for StreamSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn close(&mut self) {
        self.receiver.close();
    }
}
