use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{ClientUser, Invitation, LoginOutcome, ProfileUpdate, Registration};
use crate::constants::{
    ENDPOINT_ACCOUNT, ENDPOINT_CONNECTED_AVATARS, ENDPOINT_CONNECT_AVATAR, ENDPOINT_LOGIN,
    ENDPOINT_PROFILE, ENDPOINT_REGISTER, ENDPOINT_VALIDATE_INVITATION,
};
use crate::gateway::{normalize, ApiClient};
use crate::inbox::ConnectedAvatar;
use crate::utils::{GatewayError, HamoError};

/// Client account operations: sign-in, registration, avatar connections
pub struct AccountService {
    client: Arc<ApiClient>,
}

impl AccountService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Persist tokens and user from an auth response.
    ///
    /// Cache write failures are logged; the in-memory credentials still apply.
    fn store_credentials(&self, payload: &Value) -> Option<ClientUser> {
        let user = payload.get("user").and_then(normalize::client_user);
        let mut tokens = self.client.tokens().lock();

        if let Some(access) = payload.get("access_token").and_then(Value::as_str) {
            let refresh = payload
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Err(e) = tokens.set_tokens(access.to_string(), refresh) {
                warn!(error = %e, "failed to cache tokens");
            }
        }
        if let Some(user) = &user {
            if let Err(e) = tokens.set_user(user.clone()) {
                warn!(error = %e, "failed to cache user");
            }
        }
        user
    }

    pub async fn register_client(
        &self,
        nickname: &str,
        email: &str,
        password: &str,
        invitation_code: &str,
    ) -> Result<Registration, GatewayError> {
        let payload = self
            .client
            .post_public(
                ENDPOINT_REGISTER,
                json!({
                    "nickname": nickname,
                    "email": email,
                    "password": password,
                    "invitation_code": invitation_code,
                }),
            )
            .await?;

        info!(email, "client registered");
        let user = self.store_credentials(&payload);
        let connected_avatar = payload
            .get("connected_avatar")
            .and_then(normalize::connected_avatar);

        Ok(Registration {
            user,
            connected_avatar,
        })
    }

    pub async fn login_client(&self, email: &str, password: &str) -> Result<LoginOutcome, GatewayError> {
        let payload = self
            .client
            .post_public(ENDPOINT_LOGIN, json!({ "email": email, "password": password }))
            .await?;

        info!(email, "client logged in");
        let user = self.store_credentials(&payload);

        Ok(LoginOutcome {
            user,
            connected_avatars: normalize::connected_avatars(&payload),
        })
    }

    /// Forget cached credentials; nothing is sent to the backend
    pub fn logout(&self) -> Result<(), HamoError> {
        self.client.tokens().lock().clear()
    }

    pub fn current_user(&self) -> Option<ClientUser> {
        self.client.tokens().lock().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().lock().is_authenticated()
    }

    pub async fn validate_invitation_code(&self, code: &str) -> Result<Invitation, GatewayError> {
        let payload = self
            .client
            .post_public(ENDPOINT_VALIDATE_INVITATION, json!({ "invitation_code": code }))
            .await?;

        Ok(Invitation {
            valid: payload.get("valid").and_then(Value::as_bool).unwrap_or(false),
            pro_avatar: payload.get("pro_avatar").and_then(normalize::connected_avatar),
        })
    }

    pub async fn connected_avatars(&self) -> Result<Vec<ConnectedAvatar>, GatewayError> {
        let payload = self.client.get(ENDPOINT_CONNECTED_AVATARS).await?;
        Ok(normalize::connected_avatars(&payload))
    }

    /// Connect with another avatar using its invitation code.
    ///
    /// The backend answers with either one avatar or a list; both come back
    /// as a list.
    pub async fn connect_with_avatar(&self, code: &str) -> Result<Vec<ConnectedAvatar>, GatewayError> {
        let payload = self
            .client
            .post(ENDPOINT_CONNECT_AVATAR, json!({ "invitation_code": code }))
            .await?;
        Ok(normalize::connected_avatars(&payload))
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<ClientUser>, GatewayError> {
        let body = serde_json::to_value(update)?;
        let payload = self.client.put(ENDPOINT_PROFILE, body).await?;
        Ok(self.store_credentials(&payload))
    }

    pub async fn delete_account(&self) -> Result<(), GatewayError> {
        self.client.delete(ENDPOINT_ACCOUNT).await?;
        if let Err(e) = self.client.tokens().lock().clear() {
            warn!(error = %e, "failed to clear token cache");
        }
        Ok(())
    }
}
