//! Account Module
//!
//! Account-level resource fetchers. The vendor wraps every object in a
//! common envelope (`_id`, `_version`, `_type`); fields the relay never
//! reads stay as opaque JSON values.

use reqwest::Method;
use serde::Deserialize;

use crate::auth::Session;
use crate::client::{ApiClient, ApiError};

/// Common wrapper fields present on every vendor object.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<String>,
    #[serde(rename = "_type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub email: String,
    #[serde(default)]
    pub activated_at: Option<i64>,
    #[serde(default)]
    pub membership_type: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub details: Option<AccountDetails>,
    #[serde(default)]
    pub demographics: Option<serde_json::Value>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub shelter: Option<serde_json::Value>,
    #[serde(default)]
    pub role: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AccountDetails {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<serde_json::Value>,
    #[serde(default)]
    pub unit_distance: Option<String>,
    #[serde(default)]
    pub unit_weight: Option<String>,
}

impl ApiClient {
    /// Fetch the account record for the session's user.
    pub async fn account_info(&self, session: &Session) -> Result<AccountInfo, ApiError> {
        let path = format!("/4/user/{}", session.user_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// List the account's subscriptions.
    pub async fn account_subscriptions(
        &self,
        session: &Session,
    ) -> Result<Vec<Envelope>, ApiError> {
        let path = format!("/4/user/{}/subscriptions", session.user_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch one subscription's record. Nothing downstream inspects it, so
    /// the payload stays opaque.
    pub async fn account_subscription(
        &self,
        session: &Session,
        subscription_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let path = format!("/4/subscription/{}", subscription_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch the account's shares. Nothing downstream inspects this, so the
    /// payload stays opaque.
    pub async fn account_shares(&self, session: &Session) -> Result<serde_json::Value, ApiError> {
        let path = format!("/4/user/{}/shares", session.user_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn account_info_parses_typed_subset() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/user/u1"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "u1",
                "_version": "3",
                "_type": "user",
                "email": "pet@example.com",
                "activated_at": 1600000000,
                "membership_type": "premium",
                "details": {
                    "_id": "ud1",
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "phone_number": null,
                },
                "settings": {"metric_system": true, "no_pet_survey": null},
                "shelter": null,
                "role": ["user"],
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), false);
        let session = Session::with_token("tok", "u1");
        let info = client
            .account_info(&session)
            .await
            .expect("should parse account info");

        assert_eq!(info.envelope.id, "u1");
        assert_eq!(info.email, "pet@example.com");
        assert_eq!(info.membership_type.as_deref(), Some("premium"));
        let details = info.details.expect("details present");
        assert_eq!(details.first_name.as_deref(), Some("Ada"));
        assert!(info.settings.is_some());
        assert!(info.shelter.is_none());
    }

    #[tokio::test]
    async fn subscriptions_are_envelope_list() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/user/u1/subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"_id": "s1", "_version": "1", "_type": "subscription"},
                {"_id": "s2", "_version": "1", "_type": "subscription"},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), false);
        let session = Session::with_token("tok", "u1");
        let subs = client
            .account_subscriptions(&session)
            .await
            .expect("should parse subscriptions");

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].id, "s2");
    }

    #[tokio::test]
    async fn shares_stay_opaque() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/user/u1/shares"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"_id": "sh1", "access_right": "read"},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), false);
        let session = Session::with_token("tok", "u1");
        let shares = client
            .account_shares(&session)
            .await
            .expect("should parse shares");

        assert_eq!(shares[0]["_id"], "sh1");
    }
}
