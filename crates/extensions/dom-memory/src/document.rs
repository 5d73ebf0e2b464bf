//! Arena-backed document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use pagetrace_protocols::{
    DomError, DomEvent, DomHost, EventKind, EventListener, NodeId, Rect,
};

use crate::fixture::{ElementFixture, PageFixture};
use crate::markup;

/// One element node.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub rect: Rect,
    pub value: Option<String>,
    pub text: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Node storage plus the body's top-level children.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    pub nodes: HashMap<NodeId, Node>,
    pub roots: Vec<NodeId>,
}

impl Arena {
    fn walk(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            out.push(id);
            for &child in &node.children {
                self.walk(child, out);
            }
        }
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.walk(root, &mut out);
        }
        out
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }
}

/// In-memory page implementing [`DomHost`].
pub struct MemoryDocument {
    url: RwLock<String>,
    head: String,
    scroll: RwLock<(f64, f64)>,
    arena: RwLock<Arena>,
    listeners: RwLock<HashMap<(NodeId, EventKind), Vec<EventListener>>>,
    next_id: AtomicU64,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            head: String::new(),
            scroll: RwLock::new((0.0, 0.0)),
            arena: RwLock::new(Arena::default()),
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a document from a page fixture.
    pub fn from_fixture(page: &PageFixture) -> Self {
        let mut doc = Self::new(page.url.clone());
        doc.head = page.head.clone();
        *doc.scroll.get_mut() = (page.scroll.x, page.scroll.y);
        for element in &page.body {
            doc.append_element(None, element);
        }
        debug!(
            "Loaded page {} with {} elements",
            page.url,
            doc.arena.read().nodes.len()
        );
        doc
    }

    /// Insert an element subtree under `parent` (or at the end of the body).
    ///
    /// Returns the id of the subtree root. An unknown parent appends to the body.
    pub fn append_element(&self, parent: Option<NodeId>, element: &ElementFixture) -> NodeId {
        let mut arena = self.arena.write();
        let parent = parent.filter(|p| arena.nodes.contains_key(p));
        let id = self.insert(&mut arena, parent, element);
        match parent {
            Some(p) => {
                if let Some(node) = arena.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => arena.roots.push(id),
        }
        id
    }

    fn insert(&self, arena: &mut Arena, parent: Option<NodeId>, element: &ElementFixture) -> NodeId {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = Node {
            tag: element.tag.to_ascii_uppercase(),
            attributes: element
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            rect: element.rect,
            value: element.value.clone(),
            text: element.text.clone(),
            parent,
            children: Vec::new(),
        };
        arena.nodes.insert(id, node);

        let children: Vec<NodeId> = element
            .children
            .iter()
            .map(|child| self.insert(arena, Some(id), child))
            .collect();
        if let Some(node) = arena.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// Remove a node and its subtree. Handles to removed nodes stop resolving.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        let parent = arena.node(node)?.parent;
        match parent {
            Some(p) => {
                if let Some(parent) = arena.nodes.get_mut(&p) {
                    parent.children.retain(|&c| c != node);
                }
            }
            None => arena.roots.retain(|&c| c != node),
        }

        let mut removed = Vec::new();
        arena.walk(node, &mut removed);
        for id in &removed {
            arena.nodes.remove(id);
        }
        drop(arena);

        self.listeners
            .write()
            .retain(|(id, _), _| !removed.contains(id));
        debug!("Detached {} ({} nodes)", node, removed.len());
        Ok(())
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write() = url.into();
    }

    pub fn set_scroll(&self, x: f64, y: f64) {
        *self.scroll.write() = (x, y);
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        self.arena.write().node_mut(node)?.rect = rect;
        Ok(())
    }

    /// Element at a document-order index.
    pub fn element_at(&self, index: usize) -> Option<NodeId> {
        self.all_elements().get(index).copied()
    }

    /// First element whose attribute `name` equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let arena = self.arena.read();
        arena.document_order().into_iter().find(|id| {
            arena.nodes.get(id).is_some_and(|node| {
                node.attributes
                    .iter()
                    .any(|(k, v)| k == name && v == value)
            })
        })
    }

    /// Number of listeners attached to `node` for `kind`.
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.listeners
            .read()
            .get(&(node, kind))
            .map_or(0, |l| l.len())
    }

    /// Simulate a user click. Returns the number of listeners invoked.
    pub fn click(&self, node: NodeId) -> Result<usize, DomError> {
        self.arena.read().node(node)?;
        Ok(self.dispatch(DomEvent::click(node)))
    }

    /// Simulate the user typing until the field holds `value`, firing one input event.
    pub fn type_text(&self, node: NodeId, value: impl Into<String>) -> Result<usize, DomError> {
        self.arena.write().node_mut(node)?.value = Some(value.into());
        Ok(self.dispatch(DomEvent::input(node)))
    }

    fn dispatch(&self, event: DomEvent) -> usize {
        // Listeners read back into the document; never call them under a lock.
        let listeners: Vec<EventListener> = self
            .listeners
            .read()
            .get(&(event.target, event.kind))
            .cloned()
            .unwrap_or_default();
        trace!(
            "Dispatching {} on {} to {} listeners",
            event.kind,
            event.target,
            listeners.len()
        );
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

impl DomHost for MemoryDocument {
    fn url(&self) -> String {
        self.url.read().clone()
    }

    fn all_elements(&self) -> Vec<NodeId> {
        self.arena.read().document_order()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.arena.read().nodes.contains_key(&node)
    }

    fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        Ok(self.arena.read().node(node)?.tag.clone())
    }

    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, DomError> {
        Ok(self.arena.read().node(node)?.attributes.clone())
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self
            .arena
            .read()
            .node(node)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        let attributes = &mut arena.node_mut(node)?.attributes;
        match attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError> {
        // Fixture rects are page coordinates; report them relative to the viewport.
        let rect = self.arena.read().node(node)?.rect;
        let (sx, sy) = *self.scroll.read();
        Ok(Rect::new(rect.x - sx, rect.y - sy, rect.width, rect.height))
    }

    fn scroll_offset(&self) -> (f64, f64) {
        *self.scroll.read()
    }

    fn value(&self, node: NodeId) -> Result<Option<String>, DomError> {
        Ok(self.arena.read().node(node)?.value.clone())
    }

    fn head_html(&self) -> String {
        self.head.clone()
    }

    fn body_html(&self) -> String {
        markup::serialize_body(&self.arena.read())
    }

    fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        listener: EventListener,
    ) -> Result<(), DomError> {
        self.arena.read().node(node)?;
        self.listeners
            .write()
            .entry((node, kind))
            .or_default()
            .push(listener);
        Ok(())
    }
}
