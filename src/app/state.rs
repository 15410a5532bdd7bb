use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::account::{AccountService, TokenStore};
use crate::app::Config;
use crate::gateway::{ApiClient, Gateway, HttpGateway};
use crate::inbox::{ConnectedAvatar, Inbox};
use crate::session::{Message, SessionManager};
use crate::utils::{GatewayError, HamoError};

/// Everything a signed-in run needs, wired around one shared API client.
///
/// Built at login (or from cached tokens); dropping it drops every session
/// and credential held in memory.
pub struct AppState {
    pub config: Config,
    pub account: AccountService,
    pub sessions: SessionManager,
    pub inbox: RwLock<Inbox>,
}

impl AppState {
    /// Wire the HTTP stack with the token cache at the configured location
    pub fn new(config: Config) -> Result<Self, HamoError> {
        let token_file = config
            .token_file()
            .map_err(|e| HamoError::ConfigError(e.to_string()))?;
        let tokens = TokenStore::load(token_file)?;
        let client = Arc::new(ApiClient::new(&config.api, Arc::new(Mutex::new(tokens)))?);
        let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(Arc::clone(&client)));

        Ok(Self::with_parts(config, AccountService::new(client), gateway))
    }

    /// Assemble from explicit parts (alternate gateways, tests)
    pub fn with_parts(config: Config, account: AccountService, gateway: Arc<dyn Gateway>) -> Self {
        let sessions = SessionManager::new(gateway, &config.chat);
        Self {
            config,
            account,
            sessions,
            inbox: RwLock::new(Inbox::default()),
        }
    }

    /// Id of the signed-in client, if any
    pub fn client_id(&self) -> Result<String, HamoError> {
        self.account
            .current_user()
            .map(|user| user.id)
            .ok_or_else(|| HamoError::AuthError("Not logged in. Run `hamo login` first.".to_string()))
    }

    /// Reload the connected avatars from the backend
    pub async fn refresh_inbox(&self) -> Result<Vec<ConnectedAvatar>, GatewayError> {
        let avatars = self.account.connected_avatars().await?;
        let mut inbox = self.inbox.write().await;
        for avatar in avatars {
            inbox.upsert(avatar);
        }
        Ok(inbox.sorted().into_iter().cloned().collect())
    }

    /// Merge newly connected avatars into the inbox
    pub async fn add_avatars(&self, avatars: Vec<ConnectedAvatar>) {
        let mut inbox = self.inbox.write().await;
        for avatar in avatars {
            inbox.upsert(avatar);
        }
    }

    /// Update the inbox snapshot after a drain cycle completed
    pub async fn record_drain(&self, avatar_id: &str, transcript: &[Message]) {
        self.inbox
            .write()
            .await
            .record_drain(avatar_id, transcript, Utc::now());
    }
}
