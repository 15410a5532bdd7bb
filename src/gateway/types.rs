use serde::{Deserialize, Serialize};

/// Display fragments for avatar text: the backend's own segmentation when it
/// sent one, otherwise the whole text as a single fragment.
///
/// Live replies and history records both go through here, so a reloaded
/// transcript renders the same as the live one.
pub fn display_fragments(text: &str, fragments: &[String]) -> Vec<String> {
    let fragments: Vec<String> = fragments
        .iter()
        .filter(|f| !f.trim().is_empty())
        .cloned()
        .collect();
    if fragments.is_empty() {
        vec![text.to_string()]
    } else {
        fragments
    }
}

/// Author of a persisted history record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The signed-in client
    Client,
    /// The AI avatar (counterpart role)
    Avatar,
}

/// Handle issued by the backend when a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
    /// Opaque position marker some backends return; not interpreted here
    pub initial_position: Option<String>,
}

/// Avatar reply to a single client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Full reply text as returned by the backend
    pub text: String,
    /// Display-sized pieces; never empty once normalized
    pub fragments: Vec<String>,
}

impl ChatReply {
    /// Build a reply, treating the whole text as one fragment when the
    /// backend did not pre-split it
    pub fn new(text: impl Into<String>, fragments: Vec<String>) -> Self {
        let text = text.into();
        let fragments = display_fragments(&text, &fragments);
        Self { text, fragments }
    }
}

/// One persisted message, as returned by history retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    /// Backend segmentation of an avatar message, if it kept one
    pub fragments: Vec<String>,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_fragments_is_single_fragment() {
        let reply = ChatReply::new("Hi there!", vec![]);
        assert_eq!(reply.fragments, vec!["Hi there!".to_string()]);
    }

    #[test]
    fn test_unsplit_reply_stays_whole() {
        let reply = ChatReply::new("One.\n\nTwo.", vec![]);
        assert_eq!(reply.fragments, vec!["One.\n\nTwo.".to_string()]);
    }

    #[test]
    fn test_display_fragments_ignores_blank_segments() {
        assert_eq!(
            display_fragments("whole", &["  ".to_string()]),
            vec!["whole".to_string()]
        );
        assert_eq!(
            display_fragments("a\n\nb", &["a".to_string(), "b".to_string()]),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_reply_keeps_backend_segmentation() {
        let reply = ChatReply::new(
            "One.\n\nTwo.",
            vec!["One.".to_string(), "  ".to_string(), "Two.".to_string()],
        );
        assert_eq!(reply.fragments, vec!["One.".to_string(), "Two.".to_string()]);
    }
}
