//! Capture engine errors.

use thiserror::Error;

use pagetrace_protocols::DomError;

use crate::engine::EngineState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine already started (state: {0:?})")]
    AlreadyStarted(EngineState),

    #[error("Document state has already been captured for this page")]
    SnapshotAlreadyTaken,

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}
