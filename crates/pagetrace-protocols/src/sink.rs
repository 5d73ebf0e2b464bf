//! Boundary sink protocol.
//!
//! Delivery is fire-and-forget: the engine calls [`RecordSink::emit`] and only
//! logs the result.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::record::InteractionRecord;

/// Acknowledgment returned by a sink that accepted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack {
    /// Serialized size of the accepted record.
    pub bytes: usize,
}

/// Receiver side of the capture boundary.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Accept one record. Must not block.
    fn emit(&self, record: &InteractionRecord) -> Result<Ack, RelayError>;

    /// Drain anything buffered. Default sinks buffer nothing.
    async fn close(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingSink;

    #[async_trait]
    impl RecordSink for RejectingSink {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn emit(&self, _record: &InteractionRecord) -> Result<Ack, RelayError> {
            Err(RelayError::Closed)
        }
    }

    #[tokio::test]
    async fn test_default_close_is_ok() {
        let sink = RejectingSink;
        assert!(sink.close().await.is_ok());
        assert_eq!(sink.name(), "rejecting");
    }

    #[test]
    fn test_ack_default() {
        assert_eq!(Ack::default().bytes, 0);
    }
}
