use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::client::ApiClient;
use super::normalize;
use super::traits::Gateway;
use super::types::{ChatReply, HistoryRecord, SessionHandle};
use crate::app::Language;
use crate::constants::{ENDPOINT_MIND, ENDPOINT_SESSION};
use crate::utils::GatewayError;

/// `Gateway` backed by the Hamo REST API
pub struct HttpGateway {
    client: Arc<ApiClient>,
}

impl HttpGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn session_path(session_id: &str, action: &str) -> String {
        format!("{}/{}/{}", ENDPOINT_SESSION, session_id, action)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn resolve_mind(&self, client_id: &str, avatar_id: &str) -> Result<String, GatewayError> {
        let payload = self
            .client
            .get(&format!("{}/{}/{}", ENDPOINT_MIND, client_id, avatar_id))
            .await?;
        normalize::mind_id(&payload)
    }

    async fn start_session(
        &self,
        mind_id: &str,
        avatar_id: &str,
    ) -> Result<SessionHandle, GatewayError> {
        let payload = self
            .client
            .post(
                &format!("{}/start", ENDPOINT_SESSION),
                json!({ "mind_id": mind_id, "avatar_id": avatar_id }),
            )
            .await?;
        normalize::session_handle(&payload)
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        language: Language,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, GatewayError> {
        let body = json!({ "message": text, "language": language.code() });
        let path = Self::session_path(session_id, "message");

        tokio::select! {
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            payload = self.client.post(&path, body) => normalize::chat_reply(&payload?),
        }
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<HistoryRecord>, GatewayError> {
        let payload = self
            .client
            .get(&Self::session_path(session_id, "messages"))
            .await?;
        normalize::history_records(&payload)
    }

    async fn end_session(&self, session_id: &str) -> Result<(), GatewayError> {
        self.client
            .post(&Self::session_path(session_id, "end"), json!({}))
            .await?;
        Ok(())
    }

    async fn set_visibility(&self, session_id: &str, visible: bool) -> Result<(), GatewayError> {
        self.client
            .put(
                &Self::session_path(session_id, "visibility"),
                json!({ "visible": visible }),
            )
            .await?;
        Ok(())
    }
}
