//! Payload normalization at the backend boundary.
//!
//! The backend has shipped several shapes for the same records over time
//! (snake_case and camelCase keys, numeric and string ids, single objects
//! where arrays are expected). Everything past this module sees only the
//! canonical types.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use super::types::{ChatReply, HistoryRecord, Role, SessionHandle};
use crate::account::ClientUser;
use crate::inbox::ConnectedAvatar;
use crate::utils::GatewayError;

/// Render a JSON id (string or number) as an opaque string
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_id(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(id_string))
}

fn first_str(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn string_list(obj: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Pull a human-readable message out of an error body
pub fn error_message(body: &Value) -> Option<String> {
    if let Value::String(s) = body {
        return Some(s.clone());
    }
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
}

pub fn mind_id(payload: &Value) -> Result<String, GatewayError> {
    first_id(payload, &["mind_id", "mindId", "id"])
        .or_else(|| payload.get("mind").and_then(|m| first_id(m, &["id", "mind_id"])))
        .ok_or_else(|| GatewayError::NotFound("no mind for this avatar".to_string()))
}

pub fn session_handle(payload: &Value) -> Result<SessionHandle, GatewayError> {
    let session_id = first_id(payload, &["session_id", "sessionId", "id"])
        .ok_or_else(|| GatewayError::Malformed("session start response has no id".to_string()))?;

    Ok(SessionHandle {
        session_id,
        initial_position: first_id(payload, &["initial_position", "initialPosition"]),
    })
}

pub fn chat_reply(payload: &Value) -> Result<ChatReply, GatewayError> {
    let fragments = string_list(
        payload,
        &["response_fragments", "responseFragments", "fragments"],
    );
    let text = first_str(payload, &["response", "response_text", "responseText", "reply", "message"]);

    match text {
        Some(text) => Ok(ChatReply::new(text, fragments)),
        None if !fragments.is_empty() => Ok(ChatReply::new(fragments.join("\n\n"), fragments)),
        None => Err(GatewayError::Malformed("reply has no text".to_string())),
    }
}

pub fn role(raw: &str) -> Option<Role> {
    match raw.to_ascii_lowercase().as_str() {
        "user" | "client" => Some(Role::Client),
        "assistant" | "avatar" | "ai" | "bot" => Some(Role::Avatar),
        _ => None,
    }
}

pub fn history_records(payload: &Value) -> Result<Vec<HistoryRecord>, GatewayError> {
    let items = payload
        .as_array()
        .or_else(|| payload.get("messages").and_then(Value::as_array))
        .or_else(|| payload.get("history").and_then(Value::as_array))
        .ok_or_else(|| GatewayError::Malformed("history response has no messages".to_string()))?;

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(role) = first_str(item, &["role", "sender"]).and_then(|r| role(&r)) else {
            debug!(record = %item, "skipping history record with unknown role");
            continue;
        };
        records.push(HistoryRecord {
            id: first_id(item, &["id", "message_id", "messageId"]),
            role,
            content: first_str(item, &["content", "text"]).unwrap_or_default(),
            fragments: string_list(item, &["fragments", "response_fragments", "responseFragments"]),
            timestamp: first_str(item, &["timestamp", "created_at", "createdAt", "time"]),
        });
    }
    Ok(records)
}

/// Parse a chat time given either as RFC 3339 text or epoch milliseconds
pub fn instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

pub fn connected_avatar(value: &Value) -> Option<ConnectedAvatar> {
    let id = first_id(value, &["id", "avatar_id", "avatarId"])?;
    let name = first_str(value, &["name", "avatar_name", "avatarName"]).unwrap_or_else(|| id.clone());

    Some(ConnectedAvatar {
        id,
        name,
        pro_name: first_str(value, &["pro_name", "proName"]),
        theory: first_str(value, &["theory", "specialty"]),
        picture: first_str(value, &["picture", "avatar_picture", "avatarPicture"]),
        last_chat_time: ["last_chat_time", "lastChatTime"]
            .iter()
            .find_map(|key| value.get(*key).and_then(instant)),
        messages: Vec::new(),
    })
}

/// Accept `avatars`/`connected_avatars` arrays as well as a single
/// `avatar`/`connected_avatar` object
pub fn connected_avatars(payload: &Value) -> Vec<ConnectedAvatar> {
    for key in ["avatars", "connected_avatars", "connectedAvatars"] {
        if let Some(items) = payload.get(key).and_then(Value::as_array) {
            return items.iter().filter_map(connected_avatar).collect();
        }
    }
    for key in ["avatar", "connected_avatar", "connectedAvatar", "pro_avatar"] {
        match payload.get(key) {
            Some(Value::Array(items)) => return items.iter().filter_map(connected_avatar).collect(),
            Some(obj @ Value::Object(_)) => return connected_avatar(obj).into_iter().collect(),
            _ => {}
        }
    }
    Vec::new()
}

pub fn client_user(value: &Value) -> Option<ClientUser> {
    Some(ClientUser {
        id: first_id(value, &["id", "client_id", "clientId", "user_id"])?,
        email: first_str(value, &["email"]),
        nickname: first_str(value, &["nickname", "name"]),
    })
}
