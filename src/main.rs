//! tractive2owntracks - Main Entry Point
//!
//! Republishes recent Tractive tracker positions to an OwnTracks endpoint.
//! Any unrecoverable step terminates the process with a non-zero status.

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use tractive_owntracks::auth::Session;
use tractive_owntracks::client::{ApiClient, API_BASE_URL};
use tractive_owntracks::config::Config;
use tractive_owntracks::logging;
use tractive_owntracks::relay::{self, Publisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.debug);
    info!("tractive2owntracks starting");

    let api = ApiClient::new(API_BASE_URL, config.debug);

    let session = match &config.token {
        Some(token) => {
            let user_id = config
                .user_id
                .as_deref()
                .context("TRACTIVE_USER_ID is required with TRACTIVE_TOKEN")?;
            Session::with_token(token, user_id)
        }
        None => {
            let username = config
                .username
                .as_deref()
                .context("TRACTIVE_USERNAME is not set")?;
            let password = config
                .password
                .as_deref()
                .context("TRACTIVE_PASSWORD is not set")?;
            api.authenticate(username, password)
                .await
                .context("failed to authenticate")?
        }
    };

    let publisher = Publisher::new(&config.owntracks_endpoint, &config.owntracks_tid)
        .context("failed to set up the OwnTracks publisher")?;

    let (start, end) = config.window(Utc::now());
    relay::run(&api, &session, &publisher, start, end)
        .await
        .context("relay run failed")?;

    Ok(())
}
