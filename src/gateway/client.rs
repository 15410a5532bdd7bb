use parking_lot::Mutex;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::normalize;
use crate::account::TokenStore;
use crate::app::ApiConfig;
use crate::constants::{ENDPOINT_REFRESH, SESSION_EXPIRED_MESSAGE};
use crate::utils::GatewayError;

/// Authenticated JSON client for the Hamo backend.
///
/// Attaches the cached bearer token, and on a 401 refreshes it once and
/// replays the request. Shared by the session gateway and the account service.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<Mutex<TokenStore>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: Arc<Mutex<TokenStore>>) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<Mutex<TokenStore>> {
        &self.tokens
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.request(Method::GET, endpoint, None, true).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(Method::POST, endpoint, Some(&body), true).await
    }

    /// POST without the bearer token (login, registration, invitation checks)
    pub async fn post_public(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(Method::POST, endpoint, Some(&body), false).await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        self.request(Method::PUT, endpoint, Some(&body), true).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.request(Method::DELETE, endpoint, None, true).await
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, GatewayError> {
        let mut refreshed = false;
        loop {
            let response = self.send_once(&method, endpoint, body, authenticated).await?;

            if response.status() == StatusCode::UNAUTHORIZED && authenticated && !refreshed {
                refreshed = true;
                if self.refresh_access_token().await {
                    debug!(endpoint, "retrying after token refresh");
                    continue;
                }
                if let Err(e) = self.tokens.lock().clear() {
                    warn!(error = %e, "failed to clear token cache");
                }
                return Err(GatewayError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
            }

            return parse_response(response).await;
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Response, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%method, endpoint, "api request");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if authenticated {
            let token = self.tokens.lock().access_token().map(str::to_string);
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
        }

        request.send().await.map_err(|e| {
            warn!(%method, endpoint, error = %e, "api request failed");
            GatewayError::from(e)
        })
    }

    /// Trade the refresh token for a new access token
    async fn refresh_access_token(&self) -> bool {
        let refresh = self.tokens.lock().refresh_token().map(str::to_string);
        let Some(refresh) = refresh else {
            return false;
        };

        let body = json!({ "refresh_token": refresh });
        let result = match self.send_once(&Method::POST, ENDPOINT_REFRESH, Some(&body), false).await {
            Ok(response) => parse_response(response).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(payload) => {
                let access = payload.get("access_token").and_then(Value::as_str);
                let Some(access) = access else {
                    return false;
                };
                let rotated = payload
                    .get("refresh_token")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if let Err(e) = self.tokens.lock().set_tokens(access.to_string(), rotated) {
                    warn!(error = %e, "failed to persist refreshed token");
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                false
            }
        }
    }
}

/// Turn a response into its JSON body or a `GatewayError`.
///
/// Empty and non-JSON success bodies become `{}`.
async fn parse_response(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    let text = response.text().await?;
    let data: Option<Value> = serde_json::from_str(&text).ok();

    if status.is_success() {
        return Ok(data.unwrap_or_else(|| json!({})));
    }

    let message = data
        .as_ref()
        .and_then(normalize::error_message)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    warn!(status = status.as_u16(), %message, "api error response");
    if status == StatusCode::NOT_FOUND {
        Err(GatewayError::NotFound(message))
    } else {
        Err(GatewayError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::CannedServer;
    use pretty_assertions::assert_eq;

    fn signed_in() -> Arc<Mutex<TokenStore>> {
        let mut store = TokenStore::in_memory();
        store.set_tokens("a1".to_string(), Some("r1".to_string())).unwrap();
        Arc::new(Mutex::new(store))
    }

    #[tokio::test]
    async fn test_unauthorized_refreshes_once_and_retries() {
        let server = CannedServer::start(vec![
            (401, r#"{"detail":"token expired"}"#),
            (200, r#"{"access_token":"a2"}"#),
            (200, r#"{"ok":true}"#),
        ])
        .await;
        let tokens = signed_in();
        let client = server.client(Arc::clone(&tokens));

        let payload = client.get("/client/avatars").await.unwrap();
        assert_eq!(payload, json!({"ok": true}));

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].line.starts_with("GET /client/avatars"));
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer a1"));
        assert!(requests[1].line.starts_with("POST /auth/refreshClient"));
        assert_eq!(requests[1].authorization, None);
        assert!(requests[1].body.contains("r1"));
        assert_eq!(requests[2].authorization.as_deref(), Some("Bearer a2"));

        let store = tokens.lock();
        assert_eq!(store.access_token(), Some("a2"));
        assert_eq!(store.refresh_token(), Some("r1"));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_tokens() {
        let server = CannedServer::start(vec![
            (401, ""),
            (401, r#"{"detail":"refresh token revoked"}"#),
        ])
        .await;
        let tokens = signed_in();
        let client = server.client(Arc::clone(&tokens));

        let err = client.get("/client/avatars").await.unwrap_err();
        assert_eq!(err, GatewayError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
        assert!(!tokens.lock().is_authenticated());
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_error_bodies_and_empty_success() {
        let server = CannedServer::start(vec![
            (404, r#"{"detail":"Avatar not found"}"#),
            (500, "oops"),
            (200, ""),
        ])
        .await;
        let client = server.client(Arc::new(Mutex::new(TokenStore::in_memory())));

        let err = client.get("/mind/42/7").await.unwrap_err();
        assert_eq!(err, GatewayError::NotFound("Avatar not found".to_string()));

        let err = client.post("/session/start", json!({})).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 500,
                message: "Request failed with status 500".to_string(),
            }
        );

        assert_eq!(client.post("/session/s1/end", json!({})).await.unwrap(), json!({}));
    }
}
