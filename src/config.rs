//! Configuration Module
//!
//! Immutable startup configuration read once from the environment and
//! passed by reference into every component. Nothing reads ambient state
//! after this; the debug toggle is injected into the API client explicitly.

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, TimeZone, Utc};

const DEFAULT_OWNTRACKS_ENDPOINT: &str = "http://localhost:8083/pub";

/// Process configuration.
///
/// Authentication is either username+password or a pre-issued
/// token+user-id pair. Enabling `debug` may log sensitive information,
/// including the bearer token.
#[derive(Debug, Clone)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub owntracks_endpoint: String,
    pub owntracks_username: Option<String>,
    pub owntracks_password: Option<String>,
    pub owntracks_device: Option<String>,
    pub owntracks_tid: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub debug: bool,
}

impl Config {
    /// Build the configuration from environment variables.
    ///
    /// `TRACTIVE_USERNAME` / `TRACTIVE_PASSWORD`, or `TRACTIVE_TOKEN` +
    /// `TRACTIVE_USER_ID`; `OWNTRACKS_ENDPOINT` (defaults to a local
    /// recorder), `OWNTRACKS_USERNAME` / `OWNTRACKS_PASSWORD` /
    /// `OWNTRACKS_DEVICE`, `OWNTRACKS_TID` (two letters, required);
    /// `START_TIME` / `END_TIME` as unix seconds; `TRACTIVE_DEBUG`.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            username: env_opt("TRACTIVE_USERNAME"),
            password: env_opt("TRACTIVE_PASSWORD"),
            token: env_opt("TRACTIVE_TOKEN"),
            user_id: env_opt("TRACTIVE_USER_ID"),
            owntracks_endpoint: env_opt("OWNTRACKS_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_OWNTRACKS_ENDPOINT.to_string()),
            owntracks_username: env_opt("OWNTRACKS_USERNAME"),
            owntracks_password: env_opt("OWNTRACKS_PASSWORD"),
            owntracks_device: env_opt("OWNTRACKS_DEVICE"),
            owntracks_tid: env_opt("OWNTRACKS_TID").unwrap_or_default(),
            start_time: env_unix("START_TIME")?,
            end_time: env_unix("END_TIME")?,
            debug: env_opt("TRACTIVE_DEBUG").is_some(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.token.is_none() {
            if self.username.is_none() {
                bail!("empty username and no token specified");
            }
            if self.password.is_none() {
                bail!("empty password and no token specified");
            }
        } else if self.user_id.is_none() {
            bail!("TRACTIVE_USER_ID is required when TRACTIVE_TOKEN is set");
        }
        if self.owntracks_endpoint.is_empty() {
            bail!("owntracks endpoint is not set");
        }
        if self.owntracks_tid.is_empty() {
            bail!("owntracks tracker ID (OWNTRACKS_TID) is not set");
        }
        Ok(())
    }

    /// Resolve the query window. Bounds not set explicitly default to the
    /// hour ending at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .start_time
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
            .unwrap_or(now - Duration::hours(1));
        let end = self
            .end_time
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
            .unwrap_or(now);
        (start, end)
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_unix(name: &str) -> anyhow::Result<Option<i64>> {
    match env_opt(name) {
        Some(value) => {
            let ts = value
                .parse::<i64>()
                .with_context(|| format!("{} must be a unix timestamp, got {:?}", name, value))?;
            Ok(Some(ts))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            username: Some("pet@example.com".to_string()),
            password: Some("hunter2".to_string()),
            token: None,
            user_id: None,
            owntracks_endpoint: DEFAULT_OWNTRACKS_ENDPOINT.to_string(),
            owntracks_username: None,
            owntracks_password: None,
            owntracks_device: None,
            owntracks_tid: "AB".to_string(),
            start_time: None,
            end_time: None,
            debug: false,
        }
    }

    #[test]
    fn default_window_is_the_last_hour() {
        let now = Utc.timestamp_opt(1700003600, 0).unwrap();
        let (start, end) = base_config().window(now);

        assert_eq!(end, now);
        assert_eq!(end - start, Duration::hours(1));
    }

    #[test]
    fn explicit_bounds_override_the_default() {
        let mut config = base_config();
        config.start_time = Some(100);
        config.end_time = Some(200);

        let now = Utc.timestamp_opt(1700003600, 0).unwrap();
        let (start, end) = config.window(now);

        assert_eq!(start, Utc.timestamp_opt(100, 0).unwrap());
        assert_eq!(end, Utc.timestamp_opt(200, 0).unwrap());
    }

    #[test]
    fn one_explicit_bound_keeps_the_other_default() {
        let mut config = base_config();
        config.start_time = Some(100);

        let now = Utc.timestamp_opt(1700003600, 0).unwrap();
        let (start, end) = config.window(now);

        assert_eq!(start, Utc.timestamp_opt(100, 0).unwrap());
        assert_eq!(end, now);
    }

    #[test]
    fn token_requires_user_id() {
        let mut config = base_config();
        config.username = None;
        config.password = None;
        config.token = Some("tok".to_string());

        assert!(config.validate().is_err());
        config.user_id = Some("u1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credentials_or_token_are_required() {
        let mut config = base_config();
        config.password = None;
        assert!(config.validate().is_err());

        config.password = Some("hunter2".to_string());
        config.owntracks_tid = String::new();
        assert!(config.validate().is_err());
    }
}
