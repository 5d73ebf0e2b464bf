//! JSON page fixtures.
//!
//! ```json
//! {
//!   "url": "https://example.com/login",
//!   "head": "<title>Login</title>",
//!   "body": [
//!     {"tag": "form", "rect": {"x": 0, "y": 0, "width": 400, "height": 200}, "children": [
//!       {"tag": "input", "attributes": {"name": "user"}, "rect": {"x": 10.6, "y": 20.2}, "value": ""},
//!       {"tag": "button", "attributes": {"id": "submit"}, "text": "Sign in"}
//!     ]}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use pagetrace_protocols::Rect;

use crate::error::FixtureError;

/// A whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFixture {
    pub url: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub scroll: ScrollOffset,
    #[serde(default)]
    pub body: Vec<ElementFixture>,
}

impl PageFixture {
    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Document scroll offset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// One element and its subtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementFixture {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementFixture>,
}

impl ElementFixture {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.rect.x = x;
        self.rect.y = y;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: ElementFixture) -> Self {
        self.children.push(child);
        self
    }
}
