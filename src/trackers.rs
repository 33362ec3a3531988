//! Trackers Module
//!
//! Tracker metadata and time-windowed position history. The positions
//! endpoint only exists on API v3; everything else is v4.

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::account::Envelope;
use crate::auth::Session;
use crate::client::{ApiClient, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct Tracker {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub hw_id: Option<String>,
    #[serde(default)]
    pub hw_edition: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    #[serde(default)]
    pub fw_version: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub charging_state: Option<String>,
    #[serde(default)]
    pub battery_state: Option<String>,
    #[serde(default)]
    pub capabilities: Option<serde_json::Value>,
    #[serde(default)]
    pub battery_save_mode: Option<serde_json::Value>,
}

/// One sampled location, exactly as returned by the vendor. Ordering within
/// a segment is whatever the server sent; it is not re-sorted here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerPosition {
    pub time: i64,
    pub latlong: [f64; 2],
    pub alt: i64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub course: Option<i64>,
    #[serde(default)]
    pub pos_uncertainty: Option<i64>,
    #[serde(default)]
    pub sensor_used: Option<String>,
}

impl fmt::Display for TrackerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] latitude={:.3} longitude={:.3} altitude={} speed={:?} course={:?} pos_uncertainty={:?} sensor_used={:?}",
            self.time, self.latlong[0], self.latlong[1], self.alt, self.speed, self.course,
            self.pos_uncertainty, self.sensor_used
        )
    }
}

impl ApiClient {
    /// List the user's trackers (identifiers only).
    pub async fn trackers(&self, session: &Session) -> Result<Vec<Envelope>, ApiError> {
        let path = format!("/4/user/{}/trackers", session.user_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch one tracker's metadata.
    pub async fn tracker(&self, session: &Session, tracker_id: &str) -> Result<Tracker, ApiError> {
        let path = format!("/4/tracker/{}", tracker_id);
        let body = self
            .execute(Method::GET, &path, &[], Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch a tracker's position history between `start` and `end`.
    ///
    /// The vendor returns the history split into segments, one per
    /// contiguous tracked interval; gaps between segments are tracking
    /// outages. The window bounds are passed through as-is, with no
    /// validation that `start < end`.
    pub async fn positions(
        &self,
        session: &Session,
        tracker_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Vec<TrackerPosition>>, ApiError> {
        let path = format!("/3/tracker/{}/positions", tracker_id);
        let query = [
            ("time_from", start.timestamp().to_string()),
            ("time_to", end.timestamp().to_string()),
            ("format", "json_segments".to_string()),
        ];
        let body = self
            .execute(Method::GET, &path, &query, Some(&session.access_token))
            .await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn positions_sends_window_and_format() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/3/tracker/t1/positions"))
            .and(query_param("time_from", "100"))
            .and(query_param("time_to", "200"))
            .and(query_param("format", "json_segments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                [
                    {"time": 100, "latlong": [48.2, 16.3], "alt": 170, "speed": 1.5,
                     "course": 90, "pos_uncertainty": 5, "sensor_used": "GPS"},
                    {"time": 150, "latlong": [48.3, 16.4], "alt": 171},
                ],
                [
                    {"time": 200, "latlong": [48.4, 16.5], "alt": 172},
                ],
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), false);
        let session = Session::with_token("tok", "u1");
        let segments = client
            .positions(
                &session,
                "t1",
                Utc.timestamp_opt(100, 0).unwrap(),
                Utc.timestamp_opt(200, 0).unwrap(),
            )
            .await
            .expect("should parse segments");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[0][0].latlong, [48.2, 16.3]);
        assert_eq!(segments[0][0].sensor_used.as_deref(), Some("GPS"));
        assert_eq!(segments[0][1].pos_uncertainty, None);
        assert_eq!(segments[1][0].time, 200);
    }

    #[tokio::test]
    async fn tracker_detail_tolerates_unknown_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/tracker/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "t1",
                "_type": "tracker",
                "hw_id": "HW-1",
                "fw_version": "4.2.0",
                "battery_save_mode": null,
                "capabilities": ["live_tracking"],
                "some_future_field": {"nested": true},
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), false);
        let session = Session::with_token("tok", "u1");
        let tracker = client
            .tracker(&session, "t1")
            .await
            .expect("should parse tracker");

        assert_eq!(tracker.envelope.id, "t1");
        assert_eq!(tracker.hw_id.as_deref(), Some("HW-1"));
        assert!(tracker.battery_save_mode.is_none());
    }
}
