//! Interaction records sent across the boundary.
//!
//! A record is built inside an event handler, handed to the relay and then
//! dropped. The serialized form is the envelope the coordinator receives:
//!
//! ```json
//! {"action":"elementClicked","url":"https://example.com/","timestamp":1700000000000,
//!  "tagName":"BUTTON","attributes":{"id":"BUTTON_10_20"},"x":10,"y":20}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;

/// Registry contents as carried by a document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub x: i64,
    pub y: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Payload shared by click and input records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementEvent {
    pub url: String,
    pub timestamp: i64,
    pub tag_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Page-relative position, omitted when the element is not registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One interaction record. The `action` field is the discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InteractionRecord {
    /// One-shot structural snapshot taken after the initial scan.
    #[serde(rename = "captureDocumentState", rename_all = "camelCase")]
    DocumentState {
        url: String,
        timestamp: i64,
        document_body: String,
        document_head: String,
        elements: BTreeMap<String, ElementSnapshot>,
    },
    ElementClicked(ElementEvent),
    ElementInput(ElementEvent),
}

impl InteractionRecord {
    /// The discriminator of this record.
    pub fn action(&self) -> RecordAction {
        match self {
            Self::DocumentState { .. } => RecordAction::CaptureDocumentState,
            Self::ElementClicked(_) => RecordAction::ElementClicked,
            Self::ElementInput(_) => RecordAction::ElementInput,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::DocumentState { url, .. } => url,
            Self::ElementClicked(ev) | Self::ElementInput(ev) => &ev.url,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::DocumentState { timestamp, .. } => *timestamp,
            Self::ElementClicked(ev) | Self::ElementInput(ev) => ev.timestamp,
        }
    }

    /// Element payload for click and input records.
    pub fn element_event(&self) -> Option<&ElementEvent> {
        match self {
            Self::DocumentState { .. } => None,
            Self::ElementClicked(ev) | Self::ElementInput(ev) => Some(ev),
        }
    }

    /// Compact JSON, the form the browser accepts for native messages.
    pub fn to_compact_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Record discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordAction {
    CaptureDocumentState,
    ElementClicked,
    ElementInput,
}

impl RecordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordAction::CaptureDocumentState => "captureDocumentState",
            RecordAction::ElementClicked => "elementClicked",
            RecordAction::ElementInput => "elementInput",
        }
    }
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
