//! Framed record sink.

use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use parking_lot::Mutex;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{Encoder, FramedWrite};
use tracing::{debug, info, warn};

use pagetrace_protocols::{Ack, InteractionRecord, RecordSink, RelayError};

use crate::codec::{native_codec, JsonLinesCodec};

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;

/// On-the-wire layout of the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Length-prefixed frames, as read by a native-messaging host.
    #[default]
    Native,
    /// Newline-delimited JSON, for inspection.
    JsonLines,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Native => f.write_str("native"),
            OutputFormat::JsonLines => f.write_str("jsonl"),
        }
    }
}

/// [`RecordSink`] that frames records onto an async writer.
///
/// `emit` only serializes and enqueues; a background task owns the writer.
/// Must be created inside a tokio runtime.
pub struct NativeMessagingSink {
    name: String,
    max_bytes: usize,
    tx: Mutex<Option<mpsc::UnboundedSender<Bytes>>>,
    writer: Mutex<Option<JoinHandle<io::Result<u64>>>>,
}

impl NativeMessagingSink {
    /// Start a writer task over `writer`.
    pub fn spawn<W>(writer: W, format: OutputFormat, max_bytes: usize) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = match format {
            OutputFormat::Native => {
                tokio::spawn(write_frames(FramedWrite::new(writer, native_codec(max_bytes)), rx))
            }
            OutputFormat::JsonLines => {
                tokio::spawn(write_frames(FramedWrite::new(writer, JsonLinesCodec), rx))
            }
        };
        debug!("Started {} writer (max {} bytes)", format, max_bytes);

        Self {
            name: format!("native-messaging/{}", format),
            max_bytes,
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(handle)),
        }
    }

    /// Native-messaging sink on the process stdout.
    pub fn stdout(max_bytes: usize) -> Self {
        Self::spawn(tokio::io::stdout(), OutputFormat::Native, max_bytes)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

async fn write_frames<W, C>(
    mut framed: FramedWrite<W, C>,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
    C: Encoder<Bytes, Error = io::Error>,
{
    let mut written = 0;
    while let Some(frame) = rx.recv().await {
        framed.send(frame).await?;
        written += 1;
    }
    SinkExt::<Bytes>::flush(&mut framed).await?;
    Ok(written)
}

#[async_trait]
impl RecordSink for NativeMessagingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, record: &InteractionRecord) -> Result<Ack, RelayError> {
        let payload = record.to_compact_json()?;
        let bytes = payload.len();
        if bytes > self.max_bytes {
            return Err(RelayError::MessageTooLarge {
                size: bytes,
                max: self.max_bytes,
            });
        }

        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(RelayError::Closed)?;
        tx.send(Bytes::from(payload))
            .map_err(|_| RelayError::Unavailable("writer task stopped".to_string()))?;
        Ok(Ack { bytes })
    }

    /// Stop accepting records, then wait until every queued frame is written.
    async fn close(&self) -> Result<(), RelayError> {
        drop(self.tx.lock().take());
        let handle = self.writer.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        match handle.await {
            Ok(Ok(written)) => {
                info!("{} closed after {} messages", self.name, written);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("{} writer failed: {}", self.name, e);
                Err(RelayError::Io(e))
            }
            Err(e) => Err(RelayError::Unavailable(format!("writer task: {}", e))),
        }
    }
}
