use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::avatar::ConnectedAvatar;
use crate::session::Message;

/// Connected avatars, ordered for display by most recent chat
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    avatars: Vec<ConnectedAvatar>,
}

impl Inbox {
    pub fn new(avatars: Vec<ConnectedAvatar>) -> Self {
        let mut inbox = Self::default();
        for avatar in avatars {
            inbox.upsert(avatar);
        }
        inbox
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    pub fn get(&self, avatar_id: &str) -> Option<&ConnectedAvatar> {
        self.avatars.iter().find(|a| a.id == avatar_id)
    }

    /// Add an avatar, or refresh the metadata of a known one while keeping
    /// its cached transcript and chat time
    pub fn upsert(&mut self, avatar: ConnectedAvatar) {
        match self.avatars.iter_mut().find(|a| a.id == avatar.id) {
            Some(existing) => {
                let messages = std::mem::take(&mut existing.messages);
                let last_chat_time = existing.last_chat_time.max(avatar.last_chat_time);
                *existing = ConnectedAvatar {
                    messages,
                    last_chat_time,
                    ..avatar
                };
            }
            None => self.avatars.push(avatar),
        }
    }

    /// Most recent chat first; avatars never chatted with go last, by name
    pub fn sorted(&self) -> Vec<&ConnectedAvatar> {
        let mut sorted: Vec<&ConnectedAvatar> = self.avatars.iter().collect();
        sorted.sort_by(|a, b| match (a.last_chat_time, b.last_chat_time) {
            (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
        sorted
    }

    /// Refresh the denormalized snapshot after a completed drain cycle.
    /// Returns `false` for an unknown avatar.
    pub fn record_drain(&mut self, avatar_id: &str, transcript: &[Message], at: DateTime<Utc>) -> bool {
        let Some(avatar) = self.avatars.iter_mut().find(|a| a.id == avatar_id) else {
            return false;
        };
        avatar.messages = transcript.iter().filter(|m| !m.is_loading).cloned().collect();
        avatar.last_chat_time = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn avatar(id: &str, name: &str, last: Option<i64>) -> ConnectedAvatar {
        ConnectedAvatar {
            id: id.to_string(),
            name: name.to_string(),
            pro_name: None,
            theory: None,
            picture: None,
            last_chat_time: last.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
            messages: Vec::new(),
        }
    }

    fn ids(inbox: &Inbox) -> Vec<&str> {
        inbox.sorted().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_recency() {
        let inbox = Inbox::new(vec![
            avatar("old", "Old", Some(100)),
            avatar("never-b", "Beta", None),
            avatar("new", "New", Some(200)),
            avatar("never-a", "Alpha", None),
        ]);
        assert_eq!(ids(&inbox), vec!["new", "old", "never-a", "never-b"]);
    }

    #[test]
    fn test_record_drain_moves_avatar_to_top() {
        let mut inbox = Inbox::new(vec![avatar("a", "A", Some(100)), avatar("b", "B", Some(200))]);
        let transcript = vec![Message::client("hi"), Message::avatar("hello"), Message::loading()];

        assert!(inbox.record_drain("a", &transcript, Utc.timestamp_opt(300, 0).unwrap()));
        assert_eq!(ids(&inbox), vec!["a", "b"]);
        assert_eq!(inbox.get("a").unwrap().messages.len(), 2);
        assert!(!inbox.record_drain("missing", &transcript, Utc::now()));
    }

    #[test]
    fn test_upsert_keeps_cached_transcript() {
        let mut inbox = Inbox::new(vec![avatar("a", "A", Some(100))]);
        inbox.record_drain("a", &[Message::client("hi")], Utc.timestamp_opt(500, 0).unwrap());

        inbox.upsert(avatar("a", "A renamed", Some(50)));
        let a = inbox.get("a").unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(a.name, "A renamed");
        assert_eq!(a.messages.len(), 1);
        assert_eq!(a.last_chat_time, Some(Utc.timestamp_opt(500, 0).unwrap()));
    }
}
