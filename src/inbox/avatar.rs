use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CLIENT_PREVIEW_PREFIX, DATE_DISPLAY_FORMAT, TIME_DISPLAY_FORMAT};
use crate::session::{Message, Sender};

/// An avatar the client has connected with, as shown in the inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedAvatar {
    pub id: String,
    pub name: String,
    pub pro_name: Option<String>,
    pub theory: Option<String>,
    pub picture: Option<String>,
    pub last_chat_time: Option<DateTime<Utc>>,
    /// Cached transcript from the last completed drain cycle
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ConnectedAvatar {
    fn last_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.is_loading)
    }

    /// One-line preview of the latest message
    pub fn preview(&self) -> Option<String> {
        self.last_message().map(|m| match m.sender {
            Sender::Client => format!("{}{}", CLIENT_PREVIEW_PREFIX, m.text),
            Sender::Avatar => m.text.clone(),
        })
    }

    /// `HH:MM` for a chat today, `Mon D` for older ones
    pub fn time_label(&self, now: DateTime<Local>) -> Option<String> {
        let last = self.last_chat_time?.with_timezone(&Local);
        if last.date_naive() == now.date_naive() {
            Some(last.format(TIME_DISPLAY_FORMAT).to_string())
        } else {
            Some(last.format(DATE_DISPLAY_FORMAT).to_string())
        }
    }
}
