use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::{ChatReply, HistoryRecord, SessionHandle};
use crate::app::Language;
use crate::utils::GatewayError;

/// Backend capabilities the conversation core depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Find the mind bound to a (client, avatar) pair
    async fn resolve_mind(&self, client_id: &str, avatar_id: &str) -> Result<String, GatewayError>;

    /// Start a new session against a mind
    async fn start_session(
        &self,
        mind_id: &str,
        avatar_id: &str,
    ) -> Result<SessionHandle, GatewayError>;

    /// Send one client message and wait for the avatar's reply.
    ///
    /// Must return `GatewayError::Cancelled` promptly once `cancel` fires.
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        language: Language,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, GatewayError>;

    /// Persisted messages of a session, oldest first
    async fn get_history(&self, session_id: &str) -> Result<Vec<HistoryRecord>, GatewayError>;

    async fn end_session(&self, session_id: &str) -> Result<(), GatewayError>;

    /// Whether the professional behind the avatar may read the transcript
    async fn set_visibility(&self, session_id: &str, visible: bool) -> Result<(), GatewayError>;
}
