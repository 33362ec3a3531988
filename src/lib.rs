//! Tractive API Client & OwnTracks Relay
//!
//! Client for the Tractive pet tracker REST API plus a relay pipeline that
//! republishes tracked positions to an OwnTracks endpoint.

pub mod account;
pub mod auth;
pub mod client;
pub mod config;
pub mod logging;
pub mod pets;
pub mod relay;
pub mod trackers;
