//! Scripted Bot API server built on wiremock
//!
//! Mounts the subset of endpoints the relay talks to. `getUpdates` serves
//! scripted batches one poll at a time; message and topic ids count upward
//! so edits and deletes address real-looking targets.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Token baked into every mounted path
pub const TOKEN: &str = "TEST:TOKEN";

/// First thread id handed out for created forum topics
pub const FIRST_TOPIC_ID: i64 = 100;

/// Path of a Bot API method under the test token
pub fn api_path(name: &str) -> String {
    format!("/bot{TOKEN}/{name}")
}

/// Wrap a result value in the Bot API success envelope
pub fn ok_envelope(result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "ok": true, "result": result })
}

/// `getUpdates` responder that hands out one scripted batch per poll
pub struct ScriptedUpdates {
    batches: Mutex<VecDeque<serde_json::Value>>,
}

impl ScriptedUpdates {
    pub fn new(batches: Vec<serde_json::Value>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

impl Respond for ScriptedUpdates {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        #[allow(clippy::unwrap_used)]
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => ResponseTemplate::new(200).set_body_json(ok_envelope(batch)),
            // Idle polls pause briefly so the loop does not hammer the mock
            None => ResponseTemplate::new(200)
                .set_body_json(ok_envelope(serde_json::json!([])))
                .set_delay(Duration::from_millis(25)),
        }
    }
}

/// Responder producing message envelopes with counting ids
struct CountingMessages {
    next_id: AtomicI64,
}

impl Respond for CountingMessages {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
            "message_id": id,
            "chat": {"id": -1001234567890_i64, "type": "supergroup"}
        })))
    }
}

/// Responder producing forum topics with counting thread ids, echoing the
/// requested name
struct CountingTopics {
    next_id: AtomicI64,
}

impl Respond for CountingTopics {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let name = serde_json::from_slice::<serde_json::Value>(&request.body)
            .ok()
            .and_then(|body| body["name"].as_str().map(str::to_string))
            .unwrap_or_default();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
            "message_thread_id": id,
            "name": name
        })))
    }
}

/// Mount every endpoint of a well-behaved Bot API except `getUpdates`
pub async fn mount_standard_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(api_path("getMe")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
                "id": 99,
                "is_bot": true,
                "first_name": "Relay",
                "username": "relay_test_bot"
            }))),
        )
        .mount(server)
        .await;

    for name in ["sendMessage", "sendVideo", "sendDocument"] {
        Mock::given(method("POST"))
            .and(path(api_path(name)))
            .respond_with(CountingMessages {
                next_id: AtomicI64::new(1000),
            })
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(api_path("createForumTopic")))
        .respond_with(CountingTopics {
            next_id: AtomicI64::new(FIRST_TOPIC_ID),
        })
        .mount(server)
        .await;

    for name in ["editMessageText", "deleteMessage"] {
        Mock::given(method("POST"))
            .and(path(api_path(name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": true, "result": true})),
            )
            .mount(server)
            .await;
    }
}

/// Serve `text` as the content behind a manifest document upload
pub async fn mount_manifest_file(server: &MockServer, file_id: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(api_path("getFile")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!({
                "file_id": file_id,
                "file_path": "documents/manifest.txt"
            }))),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/file/bot{TOKEN}/documents/manifest.txt")))
        .respond_with(ResponseTemplate::new(200).set_body_string(text))
        .mount(server)
        .await;
}

// ----------------------------------------------------------------------------
// Update builders
// ----------------------------------------------------------------------------

/// A private-chat text message update
pub fn text_update(update_id: i64, user_id: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id, "is_bot": false, "first_name": "Operator"},
            "chat": {"id": user_id, "type": "private"},
            "date": 1_725_000_000,
            "text": text
        }
    })
}

/// A private-chat document upload update
pub fn document_update(
    update_id: i64,
    user_id: i64,
    file_id: &str,
    file_name: &str,
) -> serde_json::Value {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "from": {"id": user_id, "is_bot": false, "first_name": "Operator"},
            "chat": {"id": user_id, "type": "private"},
            "date": 1_725_000_000,
            "document": {"file_id": file_id, "file_name": file_name}
        }
    })
}

// ----------------------------------------------------------------------------
// Request inspection
// ----------------------------------------------------------------------------

/// All recorded request bodies for one API method, as UTF-8 text
#[allow(clippy::unwrap_used)]
pub async fn bodies_for(server: &MockServer, name: &str) -> Vec<String> {
    let wanted = api_path(name);
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == wanted)
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

/// The `text` field of every JSON body posted to one API method
pub async fn texts_for(server: &MockServer, name: &str) -> Vec<String> {
    bodies_for(server, name)
        .await
        .iter()
        .filter_map(|body| serde_json::from_str::<serde_json::Value>(body).ok())
        .filter_map(|body| body["text"].as_str().map(str::to_string))
        .collect()
}
