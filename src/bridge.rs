//! Restricted call surface between the web UI and the shell.
//!
//! Only the methods listed in [`ALLOWED_METHODS`] are answered; everything
//! else is refused. Handlers return canned demo data and never touch the
//! host system.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub const ALLOWED_METHODS: &[&str] = &["app.info", "app.ping", "demo.greeting", "demo.items"];

const DEMO_ITEMS: &[(&str, &str)] = &[
    ("notes", "Scratch notes"),
    ("inbox", "Inbox"),
    ("metrics", "Frame metrics"),
    ("console", "Log console"),
    ("about", "About Floatdesk"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    fn ok(id: &str, data: Value) -> Self {
        Self {
            msg_type: "response".to_string(),
            id: id.to_string(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn refused(id: &str, error: String) -> Self {
        Self {
            msg_type: "response".to_string(),
            id: id.to_string(),
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

pub struct Bridge {
    calls: AtomicU64,
}

impl Bridge {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
        }
    }

    /// Number of requests handled so far, refused ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn handle(&self, request: &BridgeRequest) -> BridgeResponse {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(id = %request.id, method = %request.method, call, "bridge request");

        let response = dispatch(request);
        if let Some(error) = &response.error {
            warn!(id = %request.id, method = %request.method, %error, "bridge request refused");
        }
        response
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

pub fn dispatch(request: &BridgeRequest) -> BridgeResponse {
    let params = &request.params;

    let data = match request.method.as_str() {
        "app.info" => json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
        "app.ping" => json!({ "pong": true, "echo": params }),
        "demo.greeting" => {
            let name = params["name"].as_str().unwrap_or("world");
            json!({ "message": format!("Hello, {}!", name) })
        }
        "demo.items" => {
            let limit = params["limit"]
                .as_u64()
                .map(|n| n as usize)
                .unwrap_or(DEMO_ITEMS.len());
            let items: Vec<Value> = DEMO_ITEMS
                .iter()
                .take(limit)
                .map(|(id, label)| json!({ "id": id, "label": label }))
                .collect();
            json!({ "items": items })
        }
        other => {
            return BridgeResponse::refused(&request.id, format!("method not allowed: {}", other));
        }
    };

    BridgeResponse::ok(&request.id, data)
}
