//! Authentication Module
//!
//! Session state obtained from the Tractive token endpoint.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use crate::client::{ApiClient, ApiError, CLIENT_ID};

/// Authenticated context required by every subsequent API call.
///
/// Created once by [`ApiClient::authenticate`] and never mutated afterwards;
/// there is no in-place token refresh.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub password: String,
    pub access_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub user_id: String,
    pub client_id: String,
}

impl Session {
    /// Build a session from a pre-issued token, skipping the login call.
    ///
    /// The expiry of such a token is unknown and recorded as the unix epoch.
    pub fn with_token(token: &str, user_id: &str) -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            access_token: token.to_string(),
            token_expires_at: DateTime::UNIX_EPOCH,
            user_id: user_id.to_string(),
            client_id: CLIENT_ID.to_string(),
        }
    }

    /// Whether the token expiry has passed.
    ///
    /// Advisory only: nothing on the core call path consults this. Callers
    /// that want expiry enforcement have to check it themselves.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.token_expires_at
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user_id: String,
    client_id: String,
    expires_at: i64,
    access_token: String,
}

impl ApiClient {
    /// Authenticate with username and password and return a [`Session`].
    ///
    /// The credentials travel as query parameters on the token endpoint,
    /// including the password. That is how the vendor protocol works, not
    /// something to change here.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let query = [
            ("grant_type", "tractive".to_string()),
            ("platform_email", username.to_string()),
            ("platform_token", password.to_string()),
        ];
        let body = self
            .execute(Method::POST, "/4/auth/token", &query, None)
            .await?;

        let resp: AuthResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))?;

        let token_expires_at = Utc
            .timestamp_opt(resp.expires_at, 0)
            .single()
            .ok_or_else(|| ApiError::Parse(format!("invalid expires_at: {}", resp.expires_at)))?;

        info!("authenticated user {}", resp.user_id);

        Ok(Session {
            username: username.to_string(),
            password: password.to_string(),
            access_token: resp.access_token,
            token_expires_at,
            user_id: resp.user_id,
            client_id: resp.client_id,
        })
    }
}
