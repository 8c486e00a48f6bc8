// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook API.
//!
//! Handles POST /webhook/message, GET /webhook/health, and
//! GET /webhook/status/{messageId}.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use ferry_core::{MessageRecord, generate_message_id, now_millis};
use ferry_queue::RecordStatus;

use crate::server::GatewayState;

/// Success body for POST /webhook/message.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub success: bool,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Error body for any rejected request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Body for GET /webhook/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub queue: QueueCounts,
}

#[derive(Debug, Serialize)]
pub struct QueueCounts {
    pub incoming: usize,
    pub processing: usize,
    pub outgoing: usize,
}

/// Body for GET /webhook/status/{messageId}. `response` is present only
/// once the record has reached `outgoing`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

/// Pulls a required non-empty string field out of the body, rejecting
/// wrong types with a field-specific message.
fn required_str(body: &Value, field: &'static str) -> Result<String, Response> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(bad_request(format!("field '{field}' must not be empty"))),
        Some(_) => Err(bad_request(format!("field '{field}' must be a string"))),
        None => Err(bad_request(format!("missing required field '{field}'"))),
    }
}

fn optional_str(body: &Value, field: &'static str) -> Result<Option<String>, Response> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(bad_request(format!("field '{field}' must be a string"))),
    }
}

/// Fields that become part of a queue file name must not be able to
/// escape the stage directory.
fn reject_path_separators(value: &str, field: &'static str) -> Result<(), Response> {
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(bad_request(format!(
            "field '{field}' must not contain path separators"
        )));
    }
    Ok(())
}

/// POST /webhook/message
///
/// Validates the body, synthesizes any missing `timestamp`/`messageId`,
/// enqueues to `incoming`, and returns the resolved `messageId`.
pub async fn post_message(State(state): State<GatewayState>, Json(body): Json<Value>) -> Response {
    let channel = match required_str(&body, "channel") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(resp) = reject_path_separators(&channel, "channel") {
        return resp;
    }
    let sender = match required_str(&body, "sender") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let message = match required_str(&body, "message") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let sender_id = match optional_str(&body, "senderId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let message_id = match optional_str(&body, "messageId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Some(id) = &message_id
        && let Err(resp) = reject_path_separators(id, "messageId")
    {
        return resp;
    }
    let timestamp = match body.get("timestamp") {
        None | Some(Value::Null) => now_millis(),
        Some(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap_or_default(),
        Some(_) => return bad_request("field 'timestamp' must be an integer"),
    };

    let record = MessageRecord {
        channel,
        sender,
        sender_id,
        message,
        timestamp,
        message_id: message_id.unwrap_or_else(generate_message_id),
    };

    match state.store.enqueue(&record) {
        Ok(_) => (
            StatusCode::OK,
            Json(EnqueueResponse {
                success: true,
                message_id: record.message_id,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "webhook enqueue failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: "failed to enqueue message".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /webhook/health
///
/// Process uptime plus the per-stage queue depths.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let counts = match state.store.counts() {
        Ok(counts) => counts,
        Err(e) => {
            error!(error = %e, "health check could not read queue");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: "queue unavailable".to_string(),
                }),
            )
                .into_response();
        }
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        queue: QueueCounts {
            incoming: counts.incoming,
            processing: counts.processing,
            outgoing: counts.outgoing,
        },
    })
    .into_response()
}

/// GET /webhook/status/{messageId}
///
/// Reports which stage a record is in, `outgoing` first since that is
/// the terminal and common case.
pub async fn get_status(
    State(state): State<GatewayState>,
    Path(message_id): Path<String>,
) -> Response {
    match state.store.find(&message_id) {
        Ok(Some(status)) => {
            let (label, response) = match status {
                RecordStatus::Completed(record) => ("completed", Some(record.message)),
                RecordStatus::Processing(_) => ("processing", None),
                RecordStatus::Queued(_) => ("queued", None),
            };
            Json(StatusResponse {
                message_id,
                status: label.to_string(),
                response,
            })
            .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                message_id,
                status: "not_found".to_string(),
                response: None,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(message_id = message_id.as_str(), error = %e, "status lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: "status lookup failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    use ferry_core::ResponseRecord;
    use ferry_queue::QueueStore;

    fn state(dir: &std::path::Path) -> GatewayState {
        GatewayState::new(QueueStore::open(dir).unwrap())
    }

    #[tokio::test]
    async fn valid_body_enqueues_and_returns_ok() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let body = json!({"channel": "webhook", "sender": "Alice", "message": "hi"});

        let response = post_message(State(state.clone()), Json(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.store.counts().unwrap().incoming, 1);
    }

    #[tokio::test]
    async fn client_supplied_ids_are_honored() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let body = json!({
            "channel": "webhook",
            "sender": "Alice",
            "message": "hi",
            "messageId": "custom-id",
            "timestamp": 1234,
            "senderId": "webhook:alice"
        });

        let response = post_message(State(state.clone()), Json(body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let pending = state.store.list_pending().unwrap();
        assert_eq!(pending[0].file_name, "webhook_custom-id.json");
        assert_eq!(pending[0].timestamp, 1234);
    }

    #[tokio::test]
    async fn missing_required_field_is_rejected() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let body = json!({"channel": "webhook", "message": "hi"});

        let response = post_message(State(state.clone()), Json(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.store.counts().unwrap().incoming, 0);
    }

    #[tokio::test]
    async fn wrong_type_is_rejected() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        for body in [
            json!({"channel": 7, "sender": "a", "message": "m"}),
            json!({"channel": "c", "sender": "a", "message": "m", "timestamp": "soon"}),
            json!({"channel": "c", "sender": "a", "message": "   "}),
        ] {
            let response = post_message(State(state.clone()), Json(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn path_separators_in_filename_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        for body in [
            json!({"channel": "web/hook", "sender": "a", "message": "m"}),
            json!({"channel": "c", "sender": "a", "message": "m", "messageId": "../../etc/passwd"}),
            json!({"channel": "c", "sender": "a", "message": "m", "messageId": "id\\1"}),
        ] {
            let response = post_message(State(state.clone()), Json(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(state.store.counts().unwrap().incoming, 0);

        // Slashes in the message body itself are ordinary content.
        let body = json!({"channel": "c", "sender": "a", "message": "a/b and c\\d"});
        let response = post_message(State(state.clone()), Json(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_queue_depths() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let body = json!({"channel": "webhook", "sender": "a", "message": "m"});
        post_message(State(state.clone()), Json(body)).await;

        let response = get_health(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_walks_the_stages() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let body = json!({
            "channel": "webhook", "sender": "a", "message": "m", "messageId": "id-1"
        });
        post_message(State(state.clone()), Json(body)).await;

        let response = get_status(State(state.clone()), Path("id-1".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        state
            .store
            .enqueue_response(&ResponseRecord {
                channel: "webhook".into(),
                sender: "a".into(),
                message: "reply".into(),
                original_message: "m".into(),
                timestamp: now_millis(),
                message_id: "id-1".into(),
            })
            .unwrap();
        let response = get_status(State(state), Path("id-1".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        let response = get_status(State(state), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
