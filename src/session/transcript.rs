use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::TIME_DISPLAY_FORMAT;

// Seeded from the wall clock so local ids also sort after earlier runs
static NEXT_LOCAL_ID: Lazy<AtomicU64> =
    Lazy::new(|| AtomicU64::new(Utc::now().timestamp_millis().max(0) as u64));

/// Identity of a transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    /// Assigned by the backend to a persisted message
    Server(String),
    /// Assigned locally to optimistic and placeholder entries
    Local(u64),
}

impl MessageId {
    /// Next local id; strictly increasing within the process
    pub fn next_local() -> Self {
        Self::Local(NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    Client,
    Avatar,
}

/// One entry of a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    /// Display-formatted local time
    pub timestamp: String,
    /// Avatar turn still pending; never persisted
    #[serde(skip)]
    pub is_loading: bool,
}

impl Message {
    fn local(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::next_local(),
            sender,
            text: text.into(),
            timestamp: Local::now().format(TIME_DISPLAY_FORMAT).to_string(),
            is_loading: false,
        }
    }

    pub fn client(text: impl Into<String>) -> Self {
        Self::local(Sender::Client, text)
    }

    pub fn avatar(text: impl Into<String>) -> Self {
        Self::local(Sender::Avatar, text)
    }

    /// Placeholder for the avatar's pending reply
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::local(Sender::Avatar, "")
        }
    }
}

/// Ordered message list of one session.
///
/// Append-only apart from the loading placeholder, of which there is at most
/// one and which is always the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_loading(&self) -> bool {
        self.messages.last().is_some_and(|m| m.is_loading)
    }

    fn take_placeholder(&mut self) -> Option<Message> {
        if self.is_loading() {
            self.messages.pop()
        } else {
            None
        }
    }

    /// Append a client message, keeping a pending placeholder at the tail
    pub fn push_client(&mut self, text: impl Into<String>) {
        let placeholder = self.take_placeholder();
        self.messages.push(Message::client(text));
        self.messages.extend(placeholder);
    }

    /// Append avatar fragments in order; a pending placeholder is dropped
    pub fn push_avatar_fragments<S: AsRef<str>>(&mut self, fragments: &[S]) {
        self.clear_loading();
        self.messages
            .extend(fragments.iter().map(|f| Message::avatar(f.as_ref())));
    }

    /// Show the pending-reply placeholder unless one is already shown
    pub fn show_loading(&mut self) {
        if !self.is_loading() {
            self.messages.push(Message::loading());
        }
    }

    pub fn clear_loading(&mut self) {
        self.take_placeholder();
    }

    /// Replace everything, e.g. with freshly loaded history
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loading_count(t: &Transcript) -> usize {
        t.messages().iter().filter(|m| m.is_loading).count()
    }

    #[test]
    fn test_local_ids_increase() {
        let a = MessageId::next_local();
        let b = MessageId::next_local();
        match (a, b) {
            (MessageId::Local(a), MessageId::Local(b)) => assert!(b > a),
            _ => panic!("expected local ids"),
        }
    }

    #[test]
    fn test_placeholder_stays_last() {
        let mut t = Transcript::new();
        t.push_client("one");
        t.show_loading();
        t.push_client("two");
        t.show_loading();

        assert_eq!(t.len(), 3);
        assert_eq!(loading_count(&t), 1);
        assert!(t.is_loading());
        assert_eq!(t.messages()[1].text, "two");
    }

    #[test]
    fn test_fragments_replace_placeholder() {
        let mut t = Transcript::new();
        t.push_client("Hello");
        t.show_loading();
        t.push_avatar_fragments(&["Hi.", "How are you?"]);

        let texts: Vec<_> = t.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Hi.", "How are you?"]);
        assert_eq!(loading_count(&t), 0);
        assert_eq!(t.last().unwrap().sender, Sender::Avatar);
    }

    #[test]
    fn test_clear_loading_without_placeholder_is_noop() {
        let mut t = Transcript::new();
        t.push_client("x");
        t.clear_loading();
        assert_eq!(t.len(), 1);
    }
}
