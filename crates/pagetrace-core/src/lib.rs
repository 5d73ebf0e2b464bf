//! # pagetrace Core
//!
//! The DOM interaction capture engine.
//!
//! ## Architecture
//!
//! ```text
//!  DomHost (page)                       CaptureEngine
//! ┌──────────────┐  click / input   ┌──────────────────────────────┐
//! │  elements    │ ───────────────► │ handlers ──► Debouncer<Node> │
//! │  listeners   │ ◄─────────────── │    │              │          │
//! └──────────────┘  register+attach │    ▼              ▼          │
//!                                   │ ElementRegistry   Relay ─────┼──► RecordSink
//!                                   └──────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. [`CaptureEngine::start`] scans every element once, assigning identifiers
//!    and attaching listeners as it registers them.
//! 2. The document snapshot is emitted exactly once, right after the scan.
//! 3. Clicks are emitted synchronously; input is coalesced per element and
//!    emitted once the debounce window passes without further input.
//!
//! Handlers run on the host's event loop. Input coalescing spawns tokio timer
//! tasks, so the engine must be driven from inside a tokio runtime.

mod clock;
mod debounce;
mod engine;
mod engine_handlers;
mod error;
pub mod identity;
mod registry;
mod relay;

pub use clock::SessionClock;
pub use debounce::Debouncer;
pub use engine::{CaptureEngine, EngineState};
pub use error::EngineError;
pub use identity::Position;
pub use registry::{ElementRegistry, TrackedElement};
pub use relay::{RecordingSink, Relay, RelayStats};
