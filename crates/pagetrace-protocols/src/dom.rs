//! DOM host protocol definitions.
//!
//! The capture engine never owns page elements. It holds [`NodeId`] handles
//! and resolves them on demand through a [`DomHost`], so every lookup may miss
//! once the page has dropped the node.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DomError;

/// Weak handle to a node owned by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// User event kinds the engine listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Input,
}

impl EventKind {
    /// DOM event type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Input => "input",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    pub target: NodeId,
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        Self {
            kind: EventKind::Click,
            target,
        }
    }

    pub fn input(target: NodeId) -> Self {
        Self {
            kind: EventKind::Input,
            target,
        }
    }
}

/// Callback attached to a node for one event kind.
pub type EventListener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// The page as seen by the capture engine.
///
/// Implementations must not hold internal locks while invoking listeners:
/// listeners call back into the host to read attributes and values.
pub trait DomHost: Send + Sync {
    /// Current document URL.
    fn url(&self) -> String;

    /// Every element currently in the document, in document order.
    fn all_elements(&self) -> Vec<NodeId>;

    /// Whether the handle still resolves to a node attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Tag name as the document reports it (upper-case for HTML documents).
    fn tag_name(&self, node: NodeId) -> Result<String, DomError>;

    /// Current attribute set, in the element's attribute order.
    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, DomError>;

    /// Read one attribute.
    fn get_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    /// Write one attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    /// Bounding rectangle relative to the viewport.
    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError>;

    /// Document scroll offset `(x, y)`.
    fn scroll_offset(&self) -> (f64, f64);

    /// Form value, `None` for elements without one.
    fn value(&self, node: NodeId) -> Result<Option<String>, DomError>;

    /// Serialized inner markup of `<head>`.
    fn head_html(&self) -> String;

    /// Serialized inner markup of `<body>`.
    fn body_html(&self) -> String;

    /// Attach a listener for one event kind.
    fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        listener: EventListener,
    ) -> Result<(), DomError>;
}
