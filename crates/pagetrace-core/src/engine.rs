//! Capture engine: construction, startup scan and element registration.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

use pagetrace_config::CaptureConfig;
use pagetrace_protocols::{DomEvent, DomHost, EventKind, EventListener, NodeId};

use crate::clock::SessionClock;
use crate::debounce::Debouncer;
use crate::error::EngineError;
use crate::identity::{self, page_position};
use crate::registry::{ElementRegistry, TrackedElement};
use crate::relay::Relay;

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    /// Constructed, page not scanned yet.
    Created = 0,
    /// Initial scan in progress.
    Scanning = 1,
    /// Listening for user events until the page goes away.
    Capturing = 2,
}

impl From<u8> for EngineState {
    fn from(v: u8) -> Self {
        match v {
            1 => EngineState::Scanning,
            2 => EngineState::Capturing,
            _ => EngineState::Created,
        }
    }
}

/// Instruments one page and relays what the user does on it.
///
/// Always handled through an `Arc`: listeners attached to the page hold a weak
/// reference back to the engine, so dropping the last `Arc` turns them into
/// no-ops.
pub struct CaptureEngine {
    pub(crate) me: Weak<CaptureEngine>,
    pub(crate) dom: Arc<dyn DomHost>,
    pub(crate) registry: Arc<ElementRegistry>,
    pub(crate) relay: Relay,
    pub(crate) debouncer: Debouncer<NodeId>,
    pub(crate) clock: SessionClock,
    pub(crate) config: CaptureConfig,
    pub(crate) state: AtomicU8,
    pub(crate) snapshot_taken: AtomicBool,
    pub(crate) session_id: Uuid,
    pub(crate) span: Span,
}

impl CaptureEngine {
    /// Create an engine for `dom`, recording into the injected `registry`.
    pub fn new(
        dom: Arc<dyn DomHost>,
        registry: Arc<ElementRegistry>,
        relay: Relay,
        config: CaptureConfig,
    ) -> Arc<Self> {
        let session_id = Uuid::new_v4();
        let span = info_span!("capture", session = %session_id, url = %dom.url());
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            dom,
            registry,
            relay,
            debouncer: Debouncer::new(config.debounce_window()),
            clock: SessionClock::new(),
            config,
            state: AtomicU8::new(EngineState::Created as u8),
            snapshot_taken: AtomicBool::new(false),
            session_id,
            span,
        })
    }

    pub fn state(&self) -> EngineState {
        EngineState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Number of elements with input waiting for the debounce window.
    pub fn pending_inputs(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Page-load entry point: register every element, then snapshot the document.
    ///
    /// Returns the number of elements registered by the scan.
    pub fn start(&self) -> Result<usize, EngineError> {
        let _enter = self.span.enter();
        self.state
            .compare_exchange(
                EngineState::Created as u8,
                EngineState::Scanning as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|current| EngineError::AlreadyStarted(EngineState::from(current)))?;

        let elements = self.dom.all_elements();
        let mut registered = 0;
        for node in elements {
            match self.register(node) {
                Ok(_) => registered += 1,
                // The page may drop nodes while we walk it.
                Err(e) => debug!("Skipping {} during scan: {}", node, e),
            }
        }
        info!(
            "Initial scan registered {} elements ({} tracked)",
            registered,
            self.registry.len()
        );

        if self.config.snapshot_on_start {
            if let Err(e) = self.capture_document_state() {
                debug!("Skipping startup snapshot: {}", e);
            }
        }

        self.state
            .store(EngineState::Capturing as u8, Ordering::SeqCst);
        Ok(registered)
    }

    /// Register one element: resolve or assign its identifier, store it, and
    /// attach the click and input listeners if it does not carry them yet.
    pub fn register(&self, node: NodeId) -> Result<String, EngineError> {
        let tag_name = self.dom.tag_name(node)?;
        let position = page_position(self.dom.bounding_rect(node)?, self.dom.scroll_offset());
        let identity = identity::assign_identifier(
            self.dom.as_ref(),
            node,
            &self.config.identity_attribute,
            &tag_name,
            position,
        )?;
        let value = self.dom.value(node)?;

        let element = TrackedElement {
            id: identity.id.clone(),
            node,
            tag_name,
            position,
            last_value: value,
        };
        if let Some(previous) = self.registry.insert(element) {
            if previous.node != node {
                debug!(
                    "Identifier {} now refers to {} (was {})",
                    identity.id, node, previous.node
                );
            }
        }

        if self.registry.mark_instrumented(node) {
            self.attach_listeners(node)?;
        }

        debug!(
            "Registered {} as {}{}",
            node,
            identity.id,
            if identity.synthesized { " (synthesized)" } else { "" }
        );
        Ok(identity.id)
    }

    fn attach_listeners(&self, node: NodeId) -> Result<(), EngineError> {
        let engine = self.me.clone();
        let on_click: EventListener = Arc::new(move |event: &DomEvent| {
            if let Some(engine) = engine.upgrade() {
                engine.handle_click(event);
            }
        });
        self.dom.add_event_listener(node, EventKind::Click, on_click)?;

        let engine = self.me.clone();
        let on_input: EventListener = Arc::new(move |event: &DomEvent| {
            if let Some(engine) = engine.upgrade() {
                engine.handle_input(event);
            }
        });
        if let Err(e) = self.dom.add_event_listener(node, EventKind::Input, on_input) {
            warn!("Click listener attached to {} but input listener failed: {}", node, e);
            return Err(e.into());
        }
        Ok(())
    }
}
