use super::*;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use pagetrace_dom_memory::{ElementFixture, MemoryDocument, PageFixture};
use pagetrace_protocols::{Ack, InteractionRecord, RecordAction, RecordSink, RelayError};

use crate::identity::Position;
use crate::relay::RecordingSink;

const WINDOW: Duration = Duration::from_millis(500);

struct Harness {
    doc: Arc<MemoryDocument>,
    sink: Arc<RecordingSink>,
    engine: Arc<CaptureEngine>,
}

fn login_page() -> PageFixture {
    PageFixture {
        url: "https://example.com/login".to_string(),
        head: "<title>Login</title>".to_string(),
        body: vec![
            ElementFixture::new("form").with_child(
                ElementFixture::new("input")
                    .with_attribute("name", "user")
                    .at(10.6, 20.2)
                    .with_value(""),
            ),
            ElementFixture::new("button")
                .with_attribute("id", "submit")
                .with_attribute("class", "primary")
                .at(40.0, 80.0)
                .with_text("Sign in"),
        ],
        ..Default::default()
    }
}

fn harness_with(page: PageFixture, config: CaptureConfig) -> Harness {
    let doc = Arc::new(MemoryDocument::from_fixture(&page));
    let sink = Arc::new(RecordingSink::new());
    let engine = CaptureEngine::new(
        doc.clone(),
        Arc::new(ElementRegistry::new()),
        Relay::new(sink.clone()),
        config,
    );
    Harness { doc, sink, engine }
}

fn harness(page: PageFixture) -> Harness {
    harness_with(page, CaptureConfig::default())
}

fn input_node(doc: &MemoryDocument) -> NodeId {
    doc.find_by_attribute("name", "user").unwrap()
}

#[test]
fn test_start_registers_every_element() {
    let h = harness(login_page());
    assert_eq!(h.engine.state(), EngineState::Created);

    let registered = h.engine.start().unwrap();
    assert_eq!(registered, 3);
    assert_eq!(h.engine.state(), EngineState::Capturing);
    assert_eq!(h.engine.registry().len(), 3);
}

#[test]
fn test_start_twice_is_rejected() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let err = h.engine.start().unwrap_err();
    assert!(matches!(err, EngineError::AlreadyStarted(EngineState::Capturing)));
    assert_eq!(h.sink.by_action(RecordAction::CaptureDocumentState).len(), 1);
}

#[test]
fn test_synthesized_identifier_uses_floored_page_position() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let input = input_node(&h.doc);
    assert_eq!(
        h.doc.get_attribute(input, "id").unwrap().as_deref(),
        Some("INPUT_10_20")
    );
    let entry = h.engine.registry().get("INPUT_10_20").unwrap();
    assert_eq!(entry.node, input);
    assert_eq!(entry.tag_name, "INPUT");
}

#[test]
fn test_synthesized_identifier_includes_scroll() {
    let mut page = login_page();
    page.scroll.y = 100.0;
    page.body[1].rect.y = 180.0;
    let h = harness(page);
    h.engine.start().unwrap();

    // Fixture rects are page coordinates, so scrolling must not move the id.
    let input = input_node(&h.doc);
    assert_eq!(
        h.doc.get_attribute(input, "id").unwrap().as_deref(),
        Some("INPUT_10_20")
    );
    assert_eq!(
        h.engine.registry().get("submit").unwrap().position,
        Position::new(40, 180)
    );
}

#[test]
fn test_existing_identifier_is_kept() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let button = h.doc.find_by_attribute("id", "submit").unwrap();
    assert_eq!(h.engine.registry().get("submit").unwrap().node, button);
    assert!(!h.engine.registry().contains("BUTTON_40_80"));
}

#[test]
fn test_reregistration_keeps_identifier_and_listeners() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    let input = input_node(&h.doc);

    // The element moved, but it already carries its identifier.
    h.doc
        .set_rect(input, pagetrace_protocols::Rect::new(300.0, 300.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(h.engine.register(input).unwrap(), "INPUT_10_20");
    assert_eq!(h.doc.listener_count(input, EventKind::Click), 1);
    assert_eq!(h.doc.listener_count(input, EventKind::Input), 1);
}

#[test]
fn test_collision_keeps_later_element() {
    let page = PageFixture {
        url: "https://example.com/".to_string(),
        body: vec![
            ElementFixture::new("input").at(5.0, 5.0),
            ElementFixture::new("input").at(5.4, 5.9),
        ],
        ..Default::default()
    };
    let h = harness(page);
    h.engine.start().unwrap();

    let second = h.doc.element_at(1).unwrap();
    assert_eq!(h.engine.registry().len(), 1);
    assert_eq!(h.engine.registry().get("INPUT_5_5").unwrap().node, second);
}

#[test]
fn test_snapshot_taken_once_after_scan() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    match &records[0] {
        InteractionRecord::DocumentState {
            url,
            document_head,
            document_body,
            elements,
            ..
        } => {
            assert_eq!(url, "https://example.com/login");
            assert_eq!(document_head, "<title>Login</title>");
            assert!(document_body.contains("id=\"INPUT_10_20\""));
            assert_eq!(elements.len(), 3);
            assert_eq!(elements["submit"].x, 40);
            assert_eq!(elements["INPUT_10_20"].value.as_deref(), Some(""));
        }
        other => panic!("expected document state, got {:?}", other.action()),
    }

    let err = h.engine.capture_document_state().unwrap_err();
    assert!(matches!(err, EngineError::SnapshotAlreadyTaken));
    assert_eq!(h.sink.len(), 1);
}

#[test]
fn test_snapshot_can_be_deferred() {
    let config = CaptureConfig {
        snapshot_on_start: false,
        ..Default::default()
    };
    let h = harness_with(login_page(), config);
    h.engine.start().unwrap();
    assert!(h.sink.is_empty());

    h.engine.capture_document_state().unwrap();
    assert_eq!(h.sink.by_action(RecordAction::CaptureDocumentState).len(), 1);
}

#[test]
fn test_every_click_is_relayed() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let button = h.doc.find_by_attribute("id", "submit").unwrap();
    for _ in 0..3 {
        h.doc.click(button).unwrap();
    }

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    assert_eq!(clicks.len(), 3);
    let event = clicks[0].element_event().unwrap();
    assert_eq!(event.url, "https://example.com/login");
    assert_eq!(event.tag_name, "BUTTON");
    assert_eq!(event.x, Some(40));
    assert_eq!(event.y, Some(80));
    assert_eq!(event.attributes.get("id").map(String::as_str), Some("submit"));
    assert_eq!(event.attributes.get("class").map(String::as_str), Some("primary"));
    assert!(event.value.is_none());
}

#[test]
fn test_click_reports_attributes_at_click_time() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let button = h.doc.find_by_attribute("id", "submit").unwrap();
    h.doc.set_attribute(button, "class", "primary busy").unwrap();
    h.doc.set_attribute(button, "aria-pressed", "true").unwrap();
    h.doc.click(button).unwrap();

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    let expected: BTreeMap<String, String> = h.doc.attributes(button).unwrap().into_iter().collect();
    assert_eq!(expected.len(), 3);
    assert_eq!(clicks[0].element_event().unwrap().attributes, expected);
}

#[test]
fn test_click_on_unregistered_element_omits_position() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let late = h
        .doc
        .append_element(None, &ElementFixture::new("a").with_attribute("href", "/help"));
    h.engine.handle_click(&DomEvent::click(late));

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    assert_eq!(clicks.len(), 1);
    let event = clicks[0].element_event().unwrap();
    assert_eq!(event.tag_name, "A");
    assert!(event.x.is_none());
    assert!(event.y.is_none());
    assert_eq!(event.attributes.get("href").map(String::as_str), Some("/help"));
}

#[test]
fn test_click_on_detached_element_falls_back_to_registry() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let button = h.doc.find_by_attribute("id", "submit").unwrap();
    h.doc.detach(button).unwrap();
    h.engine.handle_click(&DomEvent::click(button));

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    assert_eq!(clicks.len(), 1);
    let event = clicks[0].element_event().unwrap();
    assert_eq!(event.tag_name, "BUTTON");
    assert_eq!(event.x, Some(40));
    assert!(event.attributes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_input_burst_emits_last_value_once() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let input = input_node(&h.doc);
    for text in ["a", "al", "ali", "alic", "alice"] {
        h.doc.type_text(input, text).unwrap();
        sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(h.engine.pending_inputs(), 1);

    sleep(WINDOW).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 1);
    let event = inputs[0].element_event().unwrap();
    assert_eq!(event.value.as_deref(), Some("alice"));
    assert_eq!(event.tag_name, "INPUT");
    assert_eq!(event.x, Some(10));
    assert_eq!(event.y, Some(20));
    assert_eq!(h.engine.pending_inputs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_input_waits_for_quiet_window() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    h.doc.type_text(input_node(&h.doc), "bob").unwrap();
    sleep(Duration::from_millis(499)).await;
    assert!(h.sink.by_action(RecordAction::ElementInput).is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(h.sink.by_action(RecordAction::ElementInput).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_inputs_on_different_elements_are_independent() {
    let page = PageFixture {
        url: "https://example.com/".to_string(),
        body: vec![
            ElementFixture::new("input").with_attribute("id", "first"),
            ElementFixture::new("input").with_attribute("id", "last"),
        ],
        ..Default::default()
    };
    let h = harness(page);
    h.engine.start().unwrap();
    h.sink.clear();

    let first = h.doc.find_by_attribute("id", "first").unwrap();
    let last = h.doc.find_by_attribute("id", "last").unwrap();
    h.doc.type_text(first, "Ada").unwrap();
    h.doc.type_text(last, "Lovelace").unwrap();
    h.doc.type_text(first, "Ada K").unwrap();

    sleep(WINDOW + Duration::from_millis(1)).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 2);
    let values: Vec<_> = inputs
        .iter()
        .filter_map(|r| r.element_event().and_then(|e| e.value.clone()))
        .collect();
    assert!(values.contains(&"Ada K".to_string()));
    assert!(values.contains(&"Lovelace".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_click_reports_last_typed_value() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let input = input_node(&h.doc);
    h.doc.type_text(input, "carol").unwrap();
    h.doc.click(input).unwrap();

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    assert_eq!(
        clicks[0].element_event().unwrap().value.as_deref(),
        Some("carol")
    );
}

#[tokio::test(start_paused = true)]
async fn test_input_on_late_element_registers_it() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let late = h.doc.append_element(
        None,
        &ElementFixture::new("textarea").at(7.9, 300.0).with_value("hi"),
    );
    assert!(!h.engine.registry().contains("TEXTAREA_7_300"));

    h.engine.handle_input(&DomEvent::input(late));
    assert!(h.engine.registry().contains("TEXTAREA_7_300"));
    assert_eq!(h.doc.listener_count(late, EventKind::Input), 1);

    sleep(WINDOW + Duration::from_millis(1)).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 1);
    let event = inputs[0].element_event().unwrap();
    assert_eq!(event.x, Some(7));
    assert_eq!(event.value.as_deref(), Some("hi"));
}

#[tokio::test(start_paused = true)]
async fn test_input_on_element_detached_before_window() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    let input = input_node(&h.doc);
    h.doc.type_text(input, "dave").unwrap();
    h.doc.detach(input).unwrap();

    sleep(WINDOW + Duration::from_millis(1)).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 1);
    let event = inputs[0].element_event().unwrap();
    assert_eq!(event.tag_name, "INPUT");
    assert_eq!(event.value.as_deref(), Some("dave"));
    assert_eq!(event.x, Some(10));
    assert!(event.attributes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_input_after_detach_keeps_last_value() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let input = input_node(&h.doc);
    h.doc.type_text(input, "dave").unwrap();
    sleep(WINDOW + Duration::from_millis(1)).await;
    h.doc.detach(input).unwrap();
    h.sink.clear();

    h.engine.handle_input(&DomEvent::input(input));
    assert_eq!(
        h.engine.registry().get("INPUT_10_20").unwrap().last_value.as_deref(),
        Some("dave")
    );

    sleep(WINDOW + Duration::from_millis(1)).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].element_event().unwrap().value.as_deref(), Some("dave"));
}

#[tokio::test(start_paused = true)]
async fn test_collision_keeps_values_apart() {
    let page = PageFixture {
        url: "https://example.com/".to_string(),
        body: vec![
            ElementFixture::new("input").at(5.0, 5.0).with_value("ay"),
            ElementFixture::new("input").at(5.4, 5.9).with_value("bee"),
        ],
        ..Default::default()
    };
    let h = harness(page);
    h.engine.start().unwrap();
    h.sink.clear();

    let first = h.doc.element_at(0).unwrap();
    let second = h.doc.element_at(1).unwrap();
    h.doc.type_text(first, "secret-from-first").unwrap();
    h.doc.click(second).unwrap();

    let clicks = h.sink.by_action(RecordAction::ElementClicked);
    assert_eq!(clicks[0].element_event().unwrap().value.as_deref(), Some("bee"));
    let entry = h.engine.registry().get("INPUT_5_5").unwrap();
    assert_eq!(entry.node, second);
    assert_eq!(entry.last_value.as_deref(), Some("bee"));

    // The first element lost its slot: its input is reported without a position.
    sleep(WINDOW + Duration::from_millis(1)).await;
    let inputs = h.sink.by_action(RecordAction::ElementInput);
    assert_eq!(inputs.len(), 1);
    let event = inputs[0].element_event().unwrap();
    assert_eq!(event.value.as_deref(), Some("secret-from-first"));
    assert!(event.x.is_none());
    assert_eq!(h.doc.listener_count(first, EventKind::Input), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_engine_cancels_pending_input() {
    let h = harness(login_page());
    h.engine.start().unwrap();
    h.sink.clear();

    h.doc.type_text(input_node(&h.doc), "erin").unwrap();
    drop(h.engine);

    sleep(WINDOW * 2).await;
    assert!(h.sink.is_empty());
    // Listeners outlive the engine but do nothing.
    assert_eq!(h.doc.click(input_node(&h.doc)).unwrap(), 1);
    assert!(h.sink.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timestamps_do_not_go_backwards() {
    let h = harness(login_page());
    h.engine.start().unwrap();

    let button = h.doc.find_by_attribute("id", "submit").unwrap();
    h.doc.click(button).unwrap();
    h.doc.type_text(input_node(&h.doc), "x").unwrap();
    sleep(WINDOW + Duration::from_millis(1)).await;
    h.doc.click(button).unwrap();

    let stamps: Vec<i64> = h.sink.records().iter().map(|r| r.timestamp()).collect();
    assert_eq!(stamps.len(), 4);
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

struct FailingSink;

#[async_trait]
impl RecordSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn emit(&self, _record: &InteractionRecord) -> Result<Ack, RelayError> {
        Err(RelayError::Unavailable("no extension".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_sink_failures_do_not_stop_capture() {
    let doc = Arc::new(MemoryDocument::from_fixture(&login_page()));
    let engine = CaptureEngine::new(
        doc.clone(),
        Arc::new(ElementRegistry::new()),
        Relay::new(Arc::new(FailingSink)),
        CaptureConfig::default(),
    );
    engine.start().unwrap();

    let button = doc.find_by_attribute("id", "submit").unwrap();
    doc.click(button).unwrap();
    doc.type_text(input_node(&doc), "frank").unwrap();
    sleep(WINDOW + Duration::from_millis(1)).await;

    let stats = engine.relay().stats();
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.dropped, 3);
    assert_eq!(engine.state(), EngineState::Capturing);
}
