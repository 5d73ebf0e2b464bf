//! `pagetrace decode`: summarize a native-messaging stream.

use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tokio::io::AsyncRead;
use tracing::info;

use pagetrace_relay_native::FrameReader;

pub(crate) async fn handle_decode(input: Option<&Path>, max_bytes: usize) -> anyhow::Result<()> {
    let source: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let mut frames = FrameReader::new(source, max_bytes);
    let mut index = 0;
    while let Some(envelope) = frames.next_envelope().await? {
        println!("{}", summarize(index, &envelope));
        index += 1;
    }
    info!("Decoded {} messages", index);
    Ok(())
}

/// One line per message: index, action, url, then element or snapshot details.
pub(crate) fn summarize(index: usize, envelope: &Value) -> String {
    let action = envelope["action"].as_str().unwrap_or("?");
    let url = envelope["url"].as_str().unwrap_or("-");
    let mut line = format!("#{:<4} {:<22} {}", index, action, url);

    if action == "captureDocumentState" {
        let elements = envelope["elements"].as_object().map_or(0, |m| m.len());
        let body = envelope["documentBody"].as_str().map_or(0, str::len);
        line.push_str(&format!("  elements={} body={}B", elements, body));
        return line;
    }

    if let Some(tag) = envelope["tagName"].as_str() {
        line.push_str("  ");
        line.push_str(tag);
    }
    if let Some(attributes) = envelope["attributes"].as_object() {
        for (name, value) in attributes {
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            line.push_str(&format!(" {}={:?}", name, value));
        }
    }
    if let (Some(x), Some(y)) = (envelope["x"].as_i64(), envelope["y"].as_i64()) {
        line.push_str(&format!(" @({}, {})", x, y));
    }
    if let Some(value) = envelope["value"].as_str() {
        line.push_str(&format!(" value={:?}", value));
    }
    line
}
