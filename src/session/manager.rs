use std::sync::Arc;
use tracing::{info, warn};

use super::session::{ConversationSession, SessionInfo};
use crate::app::{ChatConfig, Language};
use crate::gateway::Gateway;
use crate::utils::SessionError;

/// Opens conversation sessions against an injected gateway
pub struct SessionManager {
    gateway: Arc<dyn Gateway>,
    language: Language,
    default_visibility: bool,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn Gateway>, chat: &ChatConfig) -> Self {
        Self {
            gateway,
            language: chat.language,
            default_visibility: chat.default_visibility,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Resolve the mind for (client, avatar), start a session on it, and
    /// load its history.
    ///
    /// Mind or session failures leave nothing behind and return
    /// `SessionError::Start`. A history failure is not fatal: the session
    /// opens with an empty transcript.
    pub async fn open_session(
        &self,
        client_id: &str,
        avatar_id: &str,
    ) -> Result<ConversationSession, SessionError> {
        let mind_id = self
            .gateway
            .resolve_mind(client_id, avatar_id)
            .await
            .map_err(SessionError::Start)?;

        let handle = self
            .gateway
            .start_session(&mind_id, avatar_id)
            .await
            .map_err(SessionError::Start)?;

        info!(session_id = %handle.session_id, avatar_id, "session started");

        let session = ConversationSession::new(
            SessionInfo {
                session_id: handle.session_id,
                mind_id,
                avatar_id: avatar_id.to_string(),
            },
            Arc::clone(&self.gateway),
            self.language,
            true,
        );

        if !self.default_visibility {
            if let Err(e) = session.set_visibility(false).await {
                warn!(error = %e, "could not apply default visibility");
            }
        }

        if let Err(e) = session.load_history().await {
            warn!(session_id = %session.session_id(), error = %e, "starting with empty transcript");
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{HistoryRecord, MockGateway, Role, SessionHandle};
    use crate::session::transcript::Sender;
    use crate::utils::GatewayError;

    fn chat_config() -> ChatConfig {
        ChatConfig::default()
    }

    #[tokio::test]
    async fn test_open_session_loads_history() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_resolve_mind()
            .withf(|client, avatar| client == "42" && avatar == "7")
            .times(1)
            .returning(|_, _| Ok("m1".to_string()));
        gateway
            .expect_start_session()
            .withf(|mind, avatar| mind == "m1" && avatar == "7")
            .times(1)
            .returning(|_, _| {
                Ok(SessionHandle {
                    session_id: "s1".to_string(),
                    initial_position: None,
                })
            });
        gateway
            .expect_get_history()
            .withf(|session| session == "s1")
            .times(1)
            .returning(|_| {
                Ok(vec![HistoryRecord {
                    id: Some("1".to_string()),
                    role: Role::Avatar,
                    content: "Welcome!".to_string(),
                    fragments: Vec::new(),
                    timestamp: None,
                }])
            });

        let manager = SessionManager::new(Arc::new(gateway), &chat_config());
        let session = manager.open_session("42", "7").await.unwrap();

        assert_eq!(session.session_id(), "s1");
        assert_eq!(session.info().mind_id, "m1");
        assert!(session.visible());
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].sender, Sender::Avatar);
    }

    #[tokio::test]
    async fn test_mind_failure_starts_nothing() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_resolve_mind()
            .returning(|_, _| Err(GatewayError::NotFound("no mind".to_string())));
        gateway.expect_start_session().times(0);
        gateway.expect_get_history().times(0);

        let manager = SessionManager::new(Arc::new(gateway), &chat_config());
        let err = manager.open_session("42", "7").await.err().unwrap();

        assert!(matches!(err, SessionError::Start(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_failure_is_not_fatal() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_resolve_mind()
            .returning(|_, _| Ok("m1".to_string()));
        gateway.expect_start_session().returning(|_, _| {
            Ok(SessionHandle {
                session_id: "s2".to_string(),
                initial_position: Some("0".to_string()),
            })
        });
        gateway
            .expect_get_history()
            .returning(|_| Err(GatewayError::Malformed("bad json".to_string())));

        let manager = SessionManager::new(Arc::new(gateway), &chat_config());
        let session = manager.open_session("42", "7").await.unwrap();

        assert_eq!(session.session_id(), "s2");
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_hidden_by_default_when_configured() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_resolve_mind()
            .returning(|_, _| Ok("m1".to_string()));
        gateway.expect_start_session().returning(|_, _| {
            Ok(SessionHandle {
                session_id: "s3".to_string(),
                initial_position: None,
            })
        });
        gateway
            .expect_set_visibility()
            .withf(|session, visible| session == "s3" && !*visible)
            .times(1)
            .returning(|_, _| Ok(()));
        gateway.expect_get_history().returning(|_| Ok(vec![]));

        let chat = ChatConfig {
            default_visibility: false,
            ..ChatConfig::default()
        };
        let manager = SessionManager::new(Arc::new(gateway), &chat);
        let session = manager.open_session("42", "7").await.unwrap();

        assert!(!session.visible());
    }
}
