//! Relay Module
//!
//! Drains recent tracker positions into an OwnTracks endpoint. One datapoint
//! is POSTed per source position; there is no batching.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::client::{ApiClient, ApiError};
use crate::pets::Pet;
use crate::trackers::TrackerPosition;

/// Value of the `d` query parameter identifying the relay as the source.
pub const SOURCE_TAG: &str = "tractive";

/// Outbound OwnTracks location payload, one per source position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    #[serde(rename = "_type")]
    pub kind: String,
    pub lat: f64,
    pub lon: f64,
    pub tst: i64,
    pub acc: i64,
    pub alt: i64,
    pub tid: String,
}

impl Datapoint {
    /// Field-for-field translation of a vendor position.
    pub fn from_position(pos: &TrackerPosition, tid: &str) -> Self {
        Self {
            kind: "location".to_string(),
            lat: pos.latlong[0],
            lon: pos.latlong[1],
            tst: pos.time,
            acc: pos.pos_uncertainty.unwrap_or(0),
            alt: pos.alt,
            tid: tid.to_string(),
        }
    }
}

/// Relay errors
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no pet found for tracker {0:?}")]
    NoPetForTracker(String),

    #[error("invalid publish endpoint: {0}")]
    Endpoint(String),

    #[error("failed to serialize datapoint: {0}")]
    Serialize(String),

    #[error("publish request failed: {0}")]
    Publish(String),

    #[error("publish http status is {0}, expected 200 OK")]
    PublishStatus(String),
}

/// Publishes datapoints to a configured OwnTracks endpoint.
pub struct Publisher {
    client: reqwest::Client,
    endpoint: Url,
    tid: String,
}

impl Publisher {
    pub fn new(endpoint: &str, tid: &str) -> Result<Self, RelayError> {
        let endpoint = Url::parse(endpoint).map_err(|e| RelayError::Endpoint(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            endpoint,
            tid: tid.to_string(),
        })
    }

    fn tid(&self) -> &str {
        &self.tid
    }

    /// Configured endpoint with the publisher identity (`u`) and source tag
    /// (`d`) set for one tracker. Existing `u`/`d` parameters on the base
    /// URL are overwritten, other parameters are kept.
    fn endpoint_for(&self, publisher_name: &str) -> Url {
        let mut url = self.endpoint.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "u" && k != "d")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("u", publisher_name);
            pairs.append_pair("d", SOURCE_TAG);
        }
        url
    }

    async fn publish(&self, url: &Url, dp: &Datapoint) -> Result<(), RelayError> {
        let body = serde_json::to_vec(dp).map_err(|e| RelayError::Serialize(e.to_string()))?;
        debug!("POST {} payload: {}", url, String::from_utf8_lossy(&body));

        // TODO send basic auth using the configured OwnTracks credentials.
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| RelayError::Publish(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(RelayError::PublishStatus(response.status().to_string()));
        }
        Ok(())
    }
}

/// Relay every tracker's positions within `[start, end]` to the publisher.
///
/// Per-tracker metadata and position fetches are best-effort: a failure logs
/// a warning and skips that tracker. Building the pet index, resolving a
/// tracker to its pet, and every single publish are fatal to the whole run.
pub async fn run(
    api: &ApiClient,
    session: &Session,
    publisher: &Publisher,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), RelayError> {
    // Pet index: every tracker id must resolve through this map later, so
    // any failure while building it aborts the run.
    let pets = api.pets(session).await?;
    info!("found {} pets", pets.len());
    let mut pets_by_device: HashMap<String, Pet> = HashMap::with_capacity(pets.len());
    for entry in &pets {
        let pet = api.pet(session, &entry.id).await?;
        debug!(
            "pet {} ({}) bound to device {}",
            entry.id, pet.details.name, pet.device_id
        );
        pets_by_device.insert(pet.device_id.clone(), pet);
    }

    let trackers = api.trackers(session).await?;
    info!("found {} trackers", trackers.len());
    info!("querying time range: {} --> {}", start, end);

    for entry in &trackers {
        let tracker = match api.tracker(session, &entry.id).await {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!("failed to get tracker {:?}: {}", entry.id, e);
                continue;
            }
        };
        debug!("tracker {}: state={:?}", entry.id, tracker.state);

        let pet = pets_by_device
            .get(&entry.id)
            .ok_or_else(|| RelayError::NoPetForTracker(entry.id.clone()))?;
        let endpoint = publisher.endpoint_for(&pet.details.name);

        let segments = match api.positions(session, &entry.id, start, end).await {
            Ok(segments) => segments,
            Err(e) => {
                warn!("failed to get positions for tracker {:?}: {}", entry.id, e);
                continue;
            }
        };

        // Only the first segment is relayed; later segments are ignored for
        // now. Iterate `segments` instead of `first()` to change that.
        let positions = segments.first().map(Vec::as_slice).unwrap_or(&[]);
        for pos in positions {
            let dp = Datapoint::from_position(pos, publisher.tid());
            debug!("  pos={}", pos);
            // A failed publish aborts the whole run; the fetch failures
            // above only skip their tracker.
            publisher.publish(&endpoint, &dp).await?;
        }
        info!("pushed {} positions for tracker {}", positions.len(), entry.id);
    }

    Ok(())
}
