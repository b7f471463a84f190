// ── JSON-RPC 1.0 envelopes ──
//
// Requests carry `method`, `params`, `id`; notifications are requests with
// a null `id`; responses carry `result`, `error`, `id`.

use serde::Deserialize;
use serde_json::{Value as Json, json};

use crate::error::Error;

/// A message received from the server, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The server expects a reply (OVSDB uses this for `echo`).
    Request { method: String, params: Json, id: Json },
    /// Fire-and-forget message (OVSDB uses this for `update`).
    Notification { method: String, params: Json },
    /// Reply to one of our requests. `error` is null on success.
    Response { id: Json, result: Json, error: Json },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Json,
    #[serde(default)]
    id: Json,
    #[serde(default)]
    result: Json,
    #[serde(default)]
    error: Json,
}

impl Message {
    pub fn from_json(json: Json) -> Result<Self, Error> {
        if !json.is_object() {
            return Err(Error::Protocol(format!("expected JSON-RPC object, got {json}")));
        }
        let envelope: Envelope = serde_json::from_value(json)?;

        match envelope.method {
            Some(method) if envelope.id.is_null() => Ok(Self::Notification {
                method,
                params: envelope.params,
            }),
            Some(method) => Ok(Self::Request {
                method,
                params: envelope.params,
                id: envelope.id,
            }),
            None if envelope.id.is_null() => Err(Error::Protocol(
                "response without an id".into(),
            )),
            None => Ok(Self::Response {
                id: envelope.id,
                result: envelope.result,
                error: envelope.error,
            }),
        }
    }
}

pub fn request(method: &str, params: Json, id: u64) -> Json {
    json!({ "method": method, "params": params, "id": id })
}

pub fn response(id: Json, result: Json) -> Json {
    json!({ "result": result, "error": null, "id": id })
}

/// Human-readable text of a JSON-RPC `error` member.
///
/// OVSDB sends either a bare string or an `{error, details}` object.
pub fn error_message(error: &Json) -> String {
    match error {
        Json::String(s) => s.clone(),
        Json::Object(obj) => {
            let kind = obj.get("error").and_then(Json::as_str).unwrap_or("error");
            match obj.get("details").and_then(Json::as_str) {
                Some(details) => format!("{kind}: {details}"),
                None => kind.to_owned(),
            }
        }
        other => other.to_string(),
    }
}
