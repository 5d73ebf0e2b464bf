//! Timed interaction scripts for `pagetrace record`.
//!
//! ```json
//! {"steps": [
//!   {"at_ms": 0,   "op": "click",  "target": {"attribute": "name", "value": "email"}},
//!   {"at_ms": 50,  "op": "type",   "target": {"attribute": "name", "value": "email"}, "value": "a@b.io"},
//!   {"at_ms": 900, "op": "scroll", "x": 0, "y": 400},
//!   {"at_ms": 950, "op": "insert", "element": {"tag": "input", "rect": {"x": 5, "y": 600}}},
//!   {"at_ms": 990, "op": "detach", "target": {"index": 2}},
//!   {"at_ms": 1200, "op": "click", "target": {"id": "submit"}}
//! ]}
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info};

use pagetrace_core::CaptureEngine;
use pagetrace_dom_memory::{ElementFixture, MemoryDocument};
use pagetrace_protocols::NodeId;

/// A whole script, steps ordered by `at_ms`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut script: Script = serde_json::from_str(raw)?;
        script.steps.sort_by_key(|step| step.at_ms);
        Ok(script)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing script {}", path.display()))
    }

    /// Offset of the last step.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.steps.last().map_or(0, |step| step.at_ms))
    }
}

/// One timed step.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Step {
    /// Offset from the start of playback.
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub op: Op,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub(crate) enum Op {
    Click {
        target: Target,
    },
    /// Set the field to `value` and fire one input event.
    Type {
        target: Target,
        value: String,
    },
    /// Append an element (under `parent`, or to the body) and register it.
    Insert {
        #[serde(default)]
        parent: Option<Target>,
        element: ElementFixture,
    },
    Detach {
        target: Target,
    },
    Scroll {
        x: f64,
        y: f64,
    },
}

/// How a step picks its element.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Target {
    /// Document-order position.
    Index { index: usize },
    /// First element with `attribute == value`.
    Attribute { attribute: String, value: String },
    /// Value of the identity attribute, including synthesized identifiers.
    Id { id: String },
}

impl Target {
    fn resolve(&self, doc: &MemoryDocument, identity_attribute: &str) -> anyhow::Result<NodeId> {
        let found = match self {
            Target::Index { index } => doc.element_at(*index),
            Target::Attribute { attribute, value } => doc.find_by_attribute(attribute, value),
            Target::Id { id } => doc.find_by_attribute(identity_attribute, id),
        };
        found.ok_or_else(|| anyhow!("no element matches {:?}", self))
    }
}

/// Play `script` against `doc` in real time. Returns the number of steps applied.
pub(crate) async fn play(
    doc: &MemoryDocument,
    engine: &Arc<CaptureEngine>,
    script: &Script,
    identity_attribute: &str,
) -> anyhow::Result<usize> {
    let started = Instant::now();
    for (i, step) in script.steps.iter().enumerate() {
        tokio::time::sleep_until(started + Duration::from_millis(step.at_ms)).await;
        apply(doc, engine, &step.op, identity_attribute)
            .with_context(|| format!("script step {} (at {} ms)", i, step.at_ms))?;
    }
    info!("Played {} steps over {:?}", script.steps.len(), started.elapsed());
    Ok(script.steps.len())
}

fn apply(
    doc: &MemoryDocument,
    engine: &Arc<CaptureEngine>,
    op: &Op,
    identity_attribute: &str,
) -> anyhow::Result<()> {
    match op {
        Op::Click { target } => {
            let node = target.resolve(doc, identity_attribute)?;
            let listeners = doc.click(node)?;
            debug!("click {} ({} listeners)", node, listeners);
        }
        Op::Type { target, value } => {
            let node = target.resolve(doc, identity_attribute)?;
            let listeners = doc.type_text(node, value.as_str())?;
            debug!("type {:?} into {} ({} listeners)", value, node, listeners);
        }
        Op::Insert { parent, element } => {
            let parent = parent
                .as_ref()
                .map(|p| p.resolve(doc, identity_attribute))
                .transpose()?;
            let node = doc.append_element(parent, element);
            let id = engine.register(node)?;
            debug!("insert {} as {}", node, id);
        }
        Op::Detach { target } => {
            let node = target.resolve(doc, identity_attribute)?;
            doc.detach(node)?;
        }
        Op::Scroll { x, y } => {
            doc.set_scroll(*x, *y);
            debug!("scroll to ({}, {})", x, y);
        }
    }
    Ok(())
}
