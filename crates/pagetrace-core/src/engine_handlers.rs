//! Event handlers and the document snapshot.

use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use tracing::{debug, info, trace};

use pagetrace_protocols::{DomEvent, ElementEvent, InteractionRecord, NodeId};

use crate::engine::CaptureEngine;
use crate::error::EngineError;
use crate::identity;
use crate::registry::TrackedElement;

impl CaptureEngine {
    /// Emit an `elementClicked` record for every click, registered target or not.
    pub fn handle_click(&self, event: &DomEvent) {
        let _enter = self.span.enter();
        let target = event.target;
        let entry = self.lookup(target);

        let value = match &entry {
            Some(entry) => entry.last_value.clone(),
            None => self.read_value(target).flatten(),
        };
        if entry.is_none() {
            trace!("Click on unregistered {}, position unknown", target);
        }

        let record = InteractionRecord::ElementClicked(self.element_event(target, entry.as_ref(), value));
        self.relay.send(record);
    }

    /// Coalesce input on the target; one `elementInput` record per quiet window.
    ///
    /// A target that was never registered (added after the initial scan) is
    /// registered on its first input. A target whose identifier now belongs to
    /// another element is coalesced without a registry entry.
    pub fn handle_input(&self, event: &DomEvent) {
        let _enter = self.span.enter();
        let target = event.target;

        let entry = match self.lookup(target) {
            Some(entry) => Some(entry),
            None if self.registry.is_instrumented(target) => {
                debug!("Input on {} whose identifier was taken by another element", target);
                None
            }
            None => self.register_on_input(target),
        };

        let value = match self.read_value(target) {
            Some(value) => {
                if let Some(entry) = &entry {
                    self.registry.set_last_value(&entry.id, value.clone());
                }
                value
            }
            None => entry.as_ref().and_then(|e| e.last_value.clone()),
        };

        let id = entry.map(|e| e.id);
        let engine = self.me.clone();
        self.debouncer.call(target, move || {
            if let Some(engine) = engine.upgrade() {
                engine.emit_input(target, id, value);
            }
        });
    }

    fn register_on_input(&self, target: NodeId) -> Option<TrackedElement> {
        match self.register(target) {
            Ok(id) => {
                debug!("Registered {} as {} on first input", target, id);
                self.registry.get(&id)
            }
            Err(e) => {
                debug!("Input on {} without registry entry: {}", target, e);
                None
            }
        }
    }

    fn emit_input(&self, target: NodeId, id: Option<String>, value: Option<String>) {
        let _enter = self.span.enter();
        let entry = id
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .filter(|entry| entry.node == target);
        let value = value.or_else(|| entry.as_ref().and_then(|e| e.last_value.clone()));

        let record = InteractionRecord::ElementInput(self.element_event(target, entry.as_ref(), value));
        self.relay.send(record);
    }

    /// Emit the one-shot `captureDocumentState` record.
    pub fn capture_document_state(&self) -> Result<(), EngineError> {
        let _enter = self.span.enter();
        if self.snapshot_taken.swap(true, Ordering::SeqCst) {
            return Err(EngineError::SnapshotAlreadyTaken);
        }

        let elements = self.registry.snapshot();
        info!("Capturing document state with {} elements", elements.len());

        let record = InteractionRecord::DocumentState {
            url: self.dom.url(),
            timestamp: self.clock.now_ms(),
            document_body: self.dom.body_html(),
            document_head: self.dom.head_html(),
            elements,
        };
        self.relay.send(record);
        Ok(())
    }

    /// Registry entry owned by `node`: by its identifier, else by handle.
    ///
    /// An entry reached through the identifier but registered for another
    /// element (a collision) is not returned.
    fn lookup(&self, node: NodeId) -> Option<TrackedElement> {
        identity::current_identifier(self.dom.as_ref(), node, &self.config.identity_attribute)
            .and_then(|id| self.registry.get(&id))
            .filter(|entry| entry.node == node)
            .or_else(|| self.registry.find_by_node(node))
    }

    /// Live form value; `None` when the node can no longer be read.
    fn read_value(&self, node: NodeId) -> Option<Option<String>> {
        if !self.dom.is_connected(node) {
            return None;
        }
        self.dom.value(node).ok()
    }

    /// Build the shared click/input payload, reading whatever the page still has.
    fn element_event(
        &self,
        target: NodeId,
        entry: Option<&TrackedElement>,
        value: Option<String>,
    ) -> ElementEvent {
        let tag_name = self
            .dom
            .tag_name(target)
            .ok()
            .or_else(|| entry.map(|e| e.tag_name.clone()))
            .unwrap_or_default();
        let attributes: BTreeMap<String, String> = self
            .dom
            .attributes(target)
            .map(|attrs| attrs.into_iter().collect())
            .unwrap_or_default();

        ElementEvent {
            url: self.dom.url(),
            timestamp: self.clock.now_ms(),
            tag_name,
            attributes,
            x: entry.map(|e| e.position.x),
            y: entry.map(|e| e.position.y),
            value,
        }
    }
}
