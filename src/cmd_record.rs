//! `pagetrace record`: capture a scripted session on a page fixture.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use pagetrace_config::Config;
use pagetrace_core::{CaptureEngine, ElementRegistry, Relay};
use pagetrace_dom_memory::{MemoryDocument, PageFixture};
use pagetrace_relay_native::{NativeMessagingSink, OutputFormat};

use crate::script::{self, Script};

const SETTLE_POLL: Duration = Duration::from_millis(10);

pub(crate) async fn handle_record(
    config: &Config,
    page: &Path,
    script_path: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let fixture = PageFixture::load(page)
        .with_context(|| format!("loading page fixture {}", page.display()))?;
    let script = Script::load(script_path)?;
    let max_bytes = config.relay.max_message_bytes;

    let sink = match output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating {}", path.display()))?;
            NativeMessagingSink::spawn(file, format, max_bytes)
        }
        None => NativeMessagingSink::spawn(tokio::io::stdout(), format, max_bytes),
    };

    let doc = Arc::new(MemoryDocument::from_fixture(&fixture));
    let engine = CaptureEngine::new(
        doc.clone(),
        Arc::new(ElementRegistry::new()),
        Relay::new(Arc::new(sink)),
        config.capture.clone(),
    );
    info!(
        "Recording {} ({} steps over {:?}, session {})",
        fixture.url,
        script.steps.len(),
        script.duration(),
        engine.session_id()
    );

    let registered = engine.start()?;
    info!("Registered {} elements", registered);

    script::play(&doc, &engine, &script, &config.capture.identity_attribute).await?;

    // Let the last burst of input reach the end of its window.
    tokio::time::sleep(config.capture.debounce_window()).await;
    while engine.pending_inputs() > 0 {
        tokio::time::sleep(SETTLE_POLL).await;
    }

    engine.relay().close().await?;
    let stats = engine.relay().stats();
    if stats.dropped > 0 {
        warn!("{} records were dropped by the sink", stats.dropped);
    }
    info!("Recorded {} messages", stats.sent);
    Ok(())
}
