//! DOM host errors.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Unsupported operation on {node}: {message}")]
    Unsupported { node: NodeId, message: String },
}
