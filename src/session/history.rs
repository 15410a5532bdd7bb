use chrono::{DateTime, Local, NaiveDateTime, Utc};

use super::transcript::{Message, MessageId, Sender};
use crate::constants::TIME_DISPLAY_FORMAT;
use crate::gateway::{display_fragments, HistoryRecord, Role};

/// Render a backend timestamp as local `HH:MM`; unknown formats pass through
pub fn display_time(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        });

    match parsed {
        Ok(utc) => utc.with_timezone(&Local).format(TIME_DISPLAY_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Rebuild a transcript from persisted records.
///
/// Avatar messages keep the backend's segmentation, exactly as live replies
/// do; client messages are kept whole. Ids derive from the record ids, so rebuilding the
/// same records twice yields the same transcript.
pub fn reconstruct(records: &[HistoryRecord]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let base_id = record
            .id
            .clone()
            .unwrap_or_else(|| format!("h{}", index));
        let timestamp = display_time(record.timestamp.as_deref());

        match record.role {
            Role::Client => messages.push(Message {
                id: MessageId::Server(base_id),
                sender: Sender::Client,
                text: record.content.clone(),
                timestamp,
                is_loading: false,
            }),
            Role::Avatar => {
                for (part, fragment) in display_fragments(&record.content, &record.fragments).into_iter().enumerate() {
                    messages.push(Message {
                        id: MessageId::Server(format!("{}-{}", base_id, part)),
                        sender: Sender::Avatar,
                        text: fragment,
                        timestamp: timestamp.clone(),
                        is_loading: false,
                    });
                }
            }
        }
    }

    messages
}
