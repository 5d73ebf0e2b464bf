//! Stable identifier assignment.
//!
//! An element keeps the identifier stored in its identity attribute. Elements
//! without one get `TAG_x_y`, built from the tag name and the floored
//! page-relative coordinates at registration time, and the identifier is
//! written back so later registrations of the same element reuse it.

use pagetrace_protocols::{DomError, DomHost, NodeId, Rect};

/// Page-relative integer coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Convert a viewport rectangle to floored page coordinates.
pub fn page_position(rect: Rect, scroll: (f64, f64)) -> Position {
    Position {
        x: (rect.x + scroll.0).floor() as i64,
        y: (rect.y + scroll.1).floor() as i64,
    }
}

/// Build the positional identifier `TAG_x_y`.
pub fn synthesize_id(tag_name: &str, position: Position) -> String {
    format!("{}_{}_{}", tag_name, position.x, position.y)
}

/// Outcome of identifier assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    /// `true` when the identifier was derived and written onto the element.
    pub synthesized: bool,
}

/// Read the element's identifier, or derive and store one.
pub fn assign_identifier(
    dom: &dyn DomHost,
    node: NodeId,
    attribute: &str,
    tag_name: &str,
    position: Position,
) -> Result<Identity, DomError> {
    if let Some(existing) = dom.get_attribute(node, attribute)? {
        if !existing.is_empty() {
            return Ok(Identity {
                id: existing,
                synthesized: false,
            });
        }
    }

    let id = synthesize_id(tag_name, position);
    dom.set_attribute(node, attribute, &id)?;
    Ok(Identity {
        id,
        synthesized: true,
    })
}

/// Identifier currently carried by the element, if any.
pub fn current_identifier(dom: &dyn DomHost, node: NodeId, attribute: &str) -> Option<String> {
    dom.get_attribute(node, attribute)
        .ok()
        .flatten()
        .filter(|id| !id.is_empty())
}
