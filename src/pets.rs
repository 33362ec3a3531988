//! Pets Module
//!
//! Pet ("trackable object") fetchers. The relay needs `device_id` and the
//! pet's display name; the rest of the payload is loosely typed upstream and
//! passes through as opaque values.

use reqwest::Method;
use serde::Deserialize;

use crate::account::Envelope;
use crate::auth::Session;
use crate::client::{ApiClient, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct Pet {
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Identifier of the tracker this pet is bound to.
    pub device_id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub read_only: Option<bool>,
    pub details: PetDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetDetails {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub name: String,
    #[serde(default)]
    pub pet_type: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub breed_ids: Option<serde_json::Value>,
    #[serde(default)]
    pub chip_id: Option<String>,
    #[serde(default)]
    pub lost_or_dead: Option<serde_json::Value>,
}

impl ApiClient {
    /// List the user's pets (identifiers only).
    pub async fn pets(&self, session: &Session) -> Result<Vec<Envelope>, ApiError> {
        let path = format!("/4/user/{}/trackable_objects", session.user_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch one pet's full record.
    pub async fn pet(&self, session: &Session, pet_id: &str) -> Result<Pet, ApiError> {
        let path = format!("/4/trackable_object/{}", pet_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}
