//! In-process mock of the Bale Bot API for tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode, Uri, header::CONTENT_TYPE},
        routing::post,
    },
    serde_json::{Value, json},
    tokio::sync::oneshot,
};

/// One request received by the mock.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub token: String,
    pub content_type: String,
    /// Parsed JSON body, `Null` for multipart uploads.
    pub json: Value,
    pub raw: String,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<CapturedCall>,
    failures: HashMap<String, (u16, String)>,
    webhook_url: String,
    next_message_id: i64,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockBaleApi {
    base_url: String,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBaleApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/{*path}", post(bale_api_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock bale api");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Credentials JSON pointing the nodes at this mock.
    pub fn credentials(&self) -> Value {
        json!({ "token": "123:ABC", "baseApiUrl": self.base_url })
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.state.lock().expect("mock state").calls.clone()
    }

    /// Make every call to `method` fail with the given error code.
    pub fn fail_method(&self, method: &str, code: u16, description: &str) {
        self.state
            .lock()
            .expect("mock state")
            .failures
            .insert(method.to_string(), (code, description.to_string()));
    }

    pub fn set_webhook_url(&self, url: &str) {
        self.state.lock().expect("mock state").webhook_url = url.to_string();
    }

    pub fn webhook_url(&self) -> String {
        self.state.lock().expect("mock state").webhook_url.clone()
    }
}

impl Drop for MockBaleApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn bale_api_handler(
    State(state): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let (token, method) = uri
        .path()
        .trim_start_matches('/')
        .rsplit_once('/')
        .map(|(bot, method)| (bot.trim_start_matches("bot").to_string(), method.to_string()))
        .unwrap_or_default();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut state = state.lock().expect("mock state");
    state.calls.push(CapturedCall {
        method: method.clone(),
        token,
        content_type,
        json: json.clone(),
        raw: String::from_utf8_lossy(&body).to_string(),
    });

    if let Some((code, description)) = state.failures.get(&method).cloned() {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
        return (
            status,
            Json(json!({ "ok": false, "error_code": code, "description": description })),
        );
    }

    let result = match method.as_str() {
        "getWebhookInfo" => json!({ "url": state.webhook_url, "pending_update_count": 0 }),
        "setWebhook" => {
            state.webhook_url = json["url"].as_str().unwrap_or_default().to_string();
            json!(true)
        },
        "deleteWebhook" => {
            state.webhook_url.clear();
            json!(true)
        },
        "deleteMessage" | "sendChatAction" => json!(true),
        _ => {
            state.next_message_id += 1;
            let mut message = json!({
                "message_id": state.next_message_id,
                "date": 0,
                "chat": { "id": json["chat_id"] },
            });
            for field in ["text", "caption"] {
                if let Some(value) = json.get(field) {
                    message[field] = value.clone();
                }
            }
            message
        },
    };

    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
}
