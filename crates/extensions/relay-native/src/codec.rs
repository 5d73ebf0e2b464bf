//! Wire codecs.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Encoder, LengthDelimitedCodec};

/// Largest message a browser accepts from a native host.
pub const MAX_NATIVE_MESSAGE: usize = 1024 * 1024;

/// Length-prefixed framing: `u32` native-endian length, then the payload.
pub fn native_codec(max_frame_length: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .native_endian()
        .max_frame_length(max_frame_length)
        .new_codec()
}

/// One payload per line. Payloads are compact JSON and never contain `\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl Encoder<Bytes> for JsonLinesCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.reserve(item.len() + 1);
        dst.put(item);
        dst.put_u8(b'\n');
        Ok(())
    }
}
