//! Element registry.
//!
//! Maps stable identifiers to tracked elements for the lifetime of one page
//! session. Entries are never removed; a later registration under the same
//! identifier replaces the earlier entry.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::{Mutex, RwLock};

use pagetrace_protocols::{ElementSnapshot, NodeId};

use crate::identity::Position;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// One element under observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedElement {
    pub id: String,
    /// Weak handle; resolve through the DOM host before use.
    pub node: NodeId,
    pub tag_name: String,
    /// Measured once at registration time.
    pub position: Position,
    /// Last observed value, used when the live element cannot be read.
    pub last_value: Option<String>,
}

impl TrackedElement {
    pub fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            x: self.position.x,
            y: self.position.y,
            value: self.last_value.clone(),
        }
    }
}

/// Registry of tracked elements, owned by the caller and shared with the engine.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    entries: RwLock<HashMap<String, TrackedElement>>,
    instrumented: Mutex<HashSet<NodeId>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an element, returning the entry it replaced.
    pub fn insert(&self, element: TrackedElement) -> Option<TrackedElement> {
        self.entries.write().insert(element.id.clone(), element)
    }

    pub fn get(&self, id: &str) -> Option<TrackedElement> {
        self.entries.read().get(id).cloned()
    }

    /// Entry currently pointing at `node`, found by scanning.
    pub fn find_by_node(&self, node: NodeId) -> Option<TrackedElement> {
        self.entries
            .read()
            .values()
            .find(|element| element.node == node)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Record a newly observed value. Returns `false` for unknown identifiers.
    pub fn set_last_value(&self, id: &str, value: Option<String>) -> bool {
        match self.entries.write().get_mut(id) {
            Some(entry) => {
                entry.last_value = value;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Registry contents in the shape carried by a document snapshot.
    pub fn snapshot(&self) -> BTreeMap<String, ElementSnapshot> {
        self.entries
            .read()
            .iter()
            .map(|(id, element)| (id.clone(), element.snapshot()))
            .collect()
    }

    /// Mark a node as carrying the engine's listeners.
    ///
    /// Returns `true` the first time for a node, `false` afterwards.
    pub fn mark_instrumented(&self, node: NodeId) -> bool {
        self.instrumented.lock().insert(node)
    }

    pub fn is_instrumented(&self, node: NodeId) -> bool {
        self.instrumented.lock().contains(&node)
    }
}
