//! Native-messaging relay for pagetrace.
//!
//! Browsers talk to native hosts over stdio with a simple framing: every
//! message is compact JSON prefixed by its byte length as a `u32` in native
//! byte order. Messages above 1 MB are rejected by the browser.
//!
//! - [`NativeMessagingSink`] writes records in that framing (or as JSON lines).
//! - [`FrameReader`] and [`read_envelopes`] decode a framed stream.

mod codec;
mod error;
mod reader;
mod sink;

pub use codec::{native_codec, JsonLinesCodec, MAX_NATIVE_MESSAGE};
pub use error::FrameError;
pub use reader::{read_envelopes, FrameReader};
pub use sink::{NativeMessagingSink, OutputFormat};
