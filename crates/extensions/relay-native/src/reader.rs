//! Frame decoding, the host side of the channel.

use futures::StreamExt;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};

use crate::codec::native_codec;
use crate::error::FrameError;

/// Reads length-prefixed JSON envelopes one at a time.
pub struct FrameReader<R> {
    frames: FramedRead<R, LengthDelimitedCodec>,
    index: usize,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, max_bytes: usize) -> Self {
        Self {
            frames: FramedRead::new(reader, native_codec(max_bytes)),
            index: 0,
        }
    }

    /// Next envelope, or `None` at a clean end of stream.
    pub async fn next_envelope(&mut self) -> Result<Option<Value>, FrameError> {
        let Some(frame) = self.frames.next().await else {
            return Ok(None);
        };
        let frame = frame?;
        let index = self.index;
        self.index += 1;
        serde_json::from_slice(&frame)
            .map(Some)
            .map_err(|source| FrameError::Json { index, source })
    }

    /// Envelopes decoded so far.
    pub fn count(&self) -> usize {
        self.index
    }
}

/// Decode a whole stream.
pub async fn read_envelopes<R>(reader: R, max_bytes: usize) -> Result<Vec<Value>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = FrameReader::new(reader, max_bytes);
    let mut envelopes = Vec::new();
    while let Some(envelope) = reader.next_envelope().await? {
        envelopes.push(envelope);
    }
    Ok(envelopes)
}
