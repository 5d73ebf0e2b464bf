//! Fixture loading errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Invalid page fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
