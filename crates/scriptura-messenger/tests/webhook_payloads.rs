// Normalize complete webhook bodies as the platform delivers them.
// Mixed batches must keep arrival order and skip broken entries.

use scriptura_messenger::{normalize_batch, EventKind};
use serde_json::Value;

fn entries(body: &str) -> Vec<Value> {
    let v: Value = serde_json::from_str(body).unwrap();
    v["entry"].as_array().cloned().unwrap_or_default()
}

#[test]
fn text_message_body() {
    let body = r#"{
        "object": "page",
        "entry": [{
            "id": "104857600000000",
            "time": 1718000000123,
            "messaging": [{
                "sender": {"id": "6612345678901234"},
                "recipient": {"id": "104857600000000"},
                "timestamp": 1718000000000,
                "message": {"mid": "m_AbC", "text": "Inona no atao hoe fahasoavana?"}
            }]
        }]
    }"#;

    let events = normalize_batch(&entries(body));
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.kind, EventKind::Message);
    assert_eq!(e.sender_id, "6612345678901234");
    assert_eq!(e.recipient_id.as_deref(), Some("104857600000000"));
    assert_eq!(e.text.as_deref(), Some("Inona no atao hoe fahasoavana?"));
    assert_eq!(e.timestamp, 1_718_000_000_000);
    assert!(!e.is_echo);
}

#[test]
fn get_started_postback_and_referral() {
    let body = r#"{
        "object": "page",
        "entry": [
            {"id": "P", "time": 1, "messaging": [{
                "sender": {"id": "A"}, "recipient": {"id": "P"}, "timestamp": 1,
                "postback": {"title": "Commencer", "payload": "GET_STARTED"}
            }]},
            {"id": "P", "time": 2, "messaging": [{
                "sender": {"id": "B"}, "recipient": {"id": "P"}, "timestamp": 2,
                "referral": {"ref": "campagne_paques", "source": "SHORTLINK", "type": "OPEN_THREAD"}
            }]}
        ]
    }"#;

    let events = normalize_batch(&entries(body));
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Postback);
    assert_eq!(events[0].payload.as_deref(), Some("GET_STARTED"));
    assert_eq!(events[1].kind, EventKind::Referral);
    assert_eq!(events[1].payload.as_deref(), Some("campagne_paques"));
}

#[test]
fn attachment_only_message_has_no_text() {
    let body = r#"{
        "object": "page",
        "entry": [{"id": "P", "time": 1, "messaging": [{
            "sender": {"id": "A"}, "recipient": {"id": "P"}, "timestamp": 1,
            "message": {"mid": "m1", "attachments": [{"type": "image", "payload": {"url": "https://x/y.jpg"}}]}
        }]}]
    }"#;

    let events = normalize_batch(&entries(body));
    assert_eq!(events[0].kind, EventKind::Message);
    assert_eq!(events[0].text, None);
}

#[test]
fn mixed_batch_keeps_order_and_drops_bad_entries() {
    let body = r#"{
        "object": "page",
        "entry": [
            {"id": "P", "time": 1, "messaging": [{"sender": {"id": "A"}, "delivery": {"watermark": 1}}]},
            {"id": "P", "time": 2, "messaging": [{"recipient": {"id": "P"}, "message": {"text": "orphan"}}]},
            {"id": "P", "time": 3},
            {"id": "P", "time": 4, "messaging": [{"sender": {"id": "C"}, "read": {"watermark": 4}}]},
            {"id": "P", "time": 5, "messaging": [{"sender": {"id": "D"}, "message": {"text": "Amen"}}]}
        ]
    }"#;

    let events = normalize_batch(&entries(body));
    let kinds: Vec<_> = events.iter().map(|e| (e.sender_id.as_str(), e.kind)).collect();
    assert_eq!(
        kinds,
        [
            ("A", EventKind::Delivery),
            ("C", EventKind::Read),
            ("D", EventKind::Message),
        ]
    );
}
