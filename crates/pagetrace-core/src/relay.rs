//! Message relay.
//!
//! Pushes records to the boundary sink without waiting on delivery. A sink
//! failure is logged and dropped; the caller never sees it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{trace, warn};

use pagetrace_protocols::{Ack, InteractionRecord, RecordAction, RecordSink, RelayError};

/// Counters for records handed to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub sent: u64,
    pub dropped: u64,
}

/// Fire-and-forget relay over a [`RecordSink`].
pub struct Relay {
    sink: Arc<dyn RecordSink>,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl Relay {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            sink,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Hand one record to the sink. The record is consumed either way.
    pub fn send(&self, record: InteractionRecord) {
        let action = record.action();
        match self.sink.emit(&record) {
            Ok(ack) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                trace!("Relayed {} to {} ({} bytes)", action, self.sink.name(), ack.bytes);
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Dropped {} record, sink {} failed: {}", action, self.sink.name(), e);
            }
        }
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Flush the sink. Only used when the host shuts the session down.
    pub async fn close(&self) -> Result<(), RelayError> {
        self.sink.close().await
    }
}

/// Sink that keeps every record in memory.
///
/// Useful for embedding the engine in tests or tools that inspect the trace
/// directly instead of forwarding it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<InteractionRecord>>,
    max_bytes: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject records whose compact JSON exceeds `max_bytes`.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            max_bytes: Some(max_bytes),
        }
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().clone()
    }

    pub fn by_action(&self, action: RecordAction) -> Vec<InteractionRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.action() == action)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn emit(&self, record: &InteractionRecord) -> Result<Ack, RelayError> {
        let bytes = record.to_compact_json()?.len();
        if let Some(max) = self.max_bytes {
            if bytes > max {
                return Err(RelayError::MessageTooLarge { size: bytes, max });
            }
        }
        self.records.lock().push(record.clone());
        Ok(Ack { bytes })
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
