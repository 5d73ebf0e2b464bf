//! # pagetrace Protocols
//!
//! Core protocol definitions for the pagetrace capture engine.
//! Contains only interface definitions and wire records - no engine logic.
//!
//! ## Core Traits
//!
//! - [`DomHost`] - The page the engine instruments (live DOM or in-memory document)
//! - [`RecordSink`] - The boundary towards the external coordinator
//!
//! ## Records
//!
//! - [`InteractionRecord`] - The envelope pushed across the boundary

pub mod dom;
pub mod error;
pub mod record;
pub mod sink;

pub use dom::{DomEvent, DomHost, EventKind, EventListener, NodeId, Rect};
pub use error::{DomError, RelayError};
pub use record::{ElementEvent, ElementSnapshot, InteractionRecord, RecordAction};
pub use sink::{Ack, RecordSink};
