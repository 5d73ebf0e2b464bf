//! Error types for the pagetrace protocol layer.

mod dom;
mod relay;

pub use dom::*;
pub use relay::*;
