//! Pane behaviour against the loopback transport.

use std::sync::Arc;
use std::thread;

use bithose_console::widget::{CLOSE_NOTICE, OPEN_NOTICE};
use bithose_console::{
    EntryOrigin, MESSAGE_TEMPLATE, Preset, SUBSCRIBE_TEMPLATE, SendError, SessionWidget,
};
use bithose_console_core::{ConnectionType, EventQueue};
use bithose_console_net::testing::{LoopbackConnector, LoopbackPeer};
use bithose_console_net::{CloseCode, CloseReason, NetworkError, SessionConfig, SessionState};

const ENDPOINT: &str = "ws://localhost:80/";

fn mount_direct(connector: &LoopbackConnector) -> (SessionWidget, LoopbackPeer) {
    let widget = SessionWidget::mount(
        0,
        SessionConfig::new(ENDPOINT),
        connector,
        ConnectionType::Direct,
    );
    let peer = connector.last_peer().unwrap();
    (widget, peer)
}

fn mount_open(connector: &LoopbackConnector) -> (SessionWidget, LoopbackPeer) {
    let (widget, peer) = mount_direct(connector);
    peer.accept();
    assert_eq!(widget.state(), SessionState::Open);
    (widget, peer)
}

#[test]
fn test_mount_opens_session() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_direct(&connector);

    assert_eq!(widget.state(), SessionState::Connecting);
    assert_eq!(peer.url(), ENDPOINT);
    assert!(widget.log().is_empty());

    peer.accept();
    assert_eq!(widget.log().texts(), vec![OPEN_NOTICE]);
    assert_eq!(widget.log().last().unwrap().origin(), EntryOrigin::LocalNotice);
}

#[test]
fn test_inbound_frames_logged_in_order() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    let frames: Vec<String> = (0..50).map(|i| format!("{{\"n\": {i}}}")).collect();
    for frame in &frames {
        peer.deliver(frame.clone());
    }

    let all = widget.log().all();
    assert_eq!(all.len(), 51);
    for (entry, frame) in all[1..].iter().zip(&frames) {
        assert_eq!(entry.origin(), EntryOrigin::RemoteFrame);
        assert_eq!(entry.text(), frame);
    }
}

#[test]
fn test_preset_literals_and_full_replacement() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    let subscribe = "{ \n  \"type\": \"subscribe\",\n  \"criteria\": [\n    { \"operator\": \"==\", \"label_pair\": { \"name\": \"channel\", \"value\": \"cool_channel\" } },\n    { \"operator\": \">\", \"label_pair\": { \"name\": \"num_of_chars\", \"value\": 5 } }\n  ] \n}\n";
    let message = "{\n  \"type\": \"message\",\n  \"message\": {\n    \"body\": \"hello\",\n    \"label_pairs\": [\n      { \"name\": \"channel\", \"value\": \"cool_channel\" },\n      { \"name\": \"num_of_chars\", \"value\": 12 }\n    ]\n  }\n}\n";
    assert_eq!(SUBSCRIBE_TEMPLATE, subscribe);
    assert_eq!(MESSAGE_TEMPLATE, message);

    widget.composer().set_text("garbage that should disappear");
    widget.load_preset(Preset::Subscribe);
    assert_eq!(widget.composer().text(), subscribe);
    widget.load_preset(Preset::Message);
    assert_eq!(widget.composer().text(), message);
    widget.load_preset(Preset::Subscribe);
    assert_eq!(widget.composer().text(), subscribe);

    // Presets never touch the session.
    assert!(peer.sent().is_empty());
    assert_eq!(widget.log().len(), 1);
}

#[test]
fn test_invalid_json_is_not_sent() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);
    let before = widget.log().len();

    widget.composer().set_text("{ not json");
    let result = widget.send();

    assert!(matches!(result, Err(SendError::Invalid(_))));
    assert!(peer.sent().is_empty());
    assert_eq!(widget.log().len(), before + 1);

    let entry = widget.log().last().unwrap();
    assert_eq!(entry.origin(), EntryOrigin::LocalNotice);
    assert!(entry.text().contains("invalid JSON"), "{}", entry.text());
    assert!(entry.text().contains("line 1"), "{}", entry.text());
}

#[test]
fn test_valid_json_sent_verbatim_once() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    // Odd spacing and key order must survive untouched.
    let text = "{\"type\":\"message\",   \"message\" : {\"label_pairs\": [], \"body\": \"x\"}}\n\n";
    widget.composer().set_text(text);
    widget.send().unwrap();

    assert_eq!(peer.sent(), vec![text.to_string()]);
    assert_eq!(widget.log().len(), 1);

    widget.load_preset(Preset::Subscribe);
    widget.send().unwrap();
    assert_eq!(peer.sent(), vec![text.to_string(), SUBSCRIBE_TEMPLATE.to_string()]);
}

#[test]
fn test_send_before_open_is_not_sent() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_direct(&connector);

    widget.load_preset(Preset::Message);
    assert_eq!(widget.send(), Err(SendError::NotOpen));
    assert!(peer.sent().is_empty());

    let all = widget.log().all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].origin(), EntryOrigin::LocalNotice);
    assert_eq!(all[0].text(), "not sent: websocket is not open");
}

#[test]
fn test_close_releases_once() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    assert!(widget.close());
    assert!(!widget.close());
    assert_eq!(peer.release_count(), 1);
    assert_eq!(widget.log().texts(), vec![OPEN_NOTICE, CLOSE_NOTICE]);

    drop(widget);
    assert_eq!(peer.release_count(), 1);
}

#[test]
fn test_drop_releases_transport() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);
    let log = widget.log().clone();

    drop(widget);
    assert_eq!(peer.release_count(), 1);
    assert!(peer.is_released());

    // The log outlives the pane and nothing more is appended.
    peer.deliver("late");
    assert_eq!(log.texts(), vec![OPEN_NOTICE, CLOSE_NOTICE]);
}

#[test]
fn test_events_after_close_are_ignored() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);
    widget.close();

    peer.deliver("{\"uuid\": \"late\"}");
    peer.fail(NetworkError::WebSocket("late".into()));
    peer.hang_up(CloseReason::new(CloseCode::Away));

    assert_eq!(widget.log().texts(), vec![OPEN_NOTICE, CLOSE_NOTICE]);
}

#[test]
fn test_failed_handshake_logs_error_then_close() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_direct(&connector);

    peer.reject(NetworkError::Connection("connection refused".into()));

    let all = widget.log().all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].origin(), EntryOrigin::ErrorNotice);
    assert_eq!(
        all[0].text(),
        "there's been an error: Connection error: connection refused"
    );
    assert_eq!(all[1].origin(), EntryOrigin::LocalNotice);
    assert_eq!(all[1].text(), "websocket closed (1006)");
    assert_eq!(widget.state(), SessionState::Closed);
}

#[test]
fn test_error_keeps_session_open() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    peer.fail(NetworkError::WebSocket("hiccup".into()));
    assert_eq!(widget.state(), SessionState::Open);

    widget.load_preset(Preset::Message);
    widget.send().unwrap();
    assert_eq!(peer.sent().len(), 1);

    let texts = widget.log().texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[1], "there's been an error: WebSocket error: hiccup");
}

#[test]
fn test_remote_close_is_logged_with_code() {
    let connector = LoopbackConnector::new();
    let (widget, peer) = mount_open(&connector);

    peer.hang_up(CloseReason::with_reason(CloseCode::Away, "broker restarting"));
    assert_eq!(
        widget.log().texts(),
        vec![OPEN_NOTICE, "websocket closed (1001: broker restarting)"]
    );

    widget.load_preset(Preset::Message);
    assert_eq!(widget.send(), Err(SendError::NotOpen));
    assert!(peer.sent().is_empty());
}

#[test]
fn test_widgets_do_not_cross_contaminate() {
    let connector = LoopbackConnector::new();
    let (a, peer_a) = mount_open(&connector);
    let (b, peer_b) = mount_open(&connector);

    let ta = {
        let peer = peer_a.clone();
        thread::spawn(move || {
            for i in 0..200 {
                peer.deliver(format!("a{i}"));
            }
        })
    };
    let tb = {
        let peer = peer_b.clone();
        thread::spawn(move || {
            for i in 0..200 {
                peer.deliver(format!("b{i}"));
            }
        })
    };
    ta.join().unwrap();
    tb.join().unwrap();

    let a_frames: Vec<String> = a.log().texts().into_iter().skip(1).collect();
    let b_frames: Vec<String> = b.log().texts().into_iter().skip(1).collect();
    assert_eq!(a_frames, (0..200).map(|i| format!("a{i}")).collect::<Vec<_>>());
    assert_eq!(b_frames, (0..200).map(|i| format!("b{i}")).collect::<Vec<_>>());

    a.load_preset(Preset::Message);
    a.send().unwrap();
    assert_eq!(peer_a.sent().len(), 1);
    assert!(peer_b.sent().is_empty());

    a.close();
    assert_eq!(peer_a.release_count(), 1);
    assert_eq!(peer_b.release_count(), 0);
    assert_eq!(b.state(), SessionState::Open);
}

#[test]
fn test_queued_delivery_defers_and_preserves_order() {
    let queue = EventQueue::new();
    let connector = LoopbackConnector::new();
    let widget = SessionWidget::mount(
        0,
        SessionConfig::new(ENDPOINT),
        &connector,
        ConnectionType::Queued(queue.handle()),
    );
    let peer = connector.last_peer().unwrap();

    peer.accept();
    for i in 0..10 {
        peer.deliver(format!("frame {i}"));
    }
    peer.hang_up(CloseReason::normal());

    // Nothing reaches the log until the queue runs.
    assert!(widget.log().is_empty());
    assert_eq!(queue.process_pending(), 12);

    let mut expected = vec![OPEN_NOTICE.to_string()];
    expected.extend((0..10).map(|i| format!("frame {i}")));
    expected.push(CLOSE_NOTICE.to_string());
    assert_eq!(widget.log().texts(), expected);
}

#[test]
fn test_queued_delivery_from_transport_thread() {
    let queue = EventQueue::new();
    let connector = LoopbackConnector::new();
    let widget = SessionWidget::mount(
        3,
        SessionConfig::new(ENDPOINT),
        &connector,
        ConnectionType::Queued(queue.handle()),
    );
    let peer = connector.last_peer().unwrap();

    let transport = thread::spawn(move || {
        peer.accept();
        for i in 0..100 {
            peer.deliver(i.to_string());
        }
    });
    transport.join().unwrap();

    queue.process_pending();
    let log = Arc::clone(widget.log());
    let texts = log.texts();
    assert_eq!(texts.len(), 101);
    assert_eq!(texts[0], OPEN_NOTICE);
    for (i, text) in texts[1..].iter().enumerate() {
        assert_eq!(text, &i.to_string());
    }
    assert_eq!(widget.index(), 3);
}
