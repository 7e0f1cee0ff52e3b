//! Notevault Library
//!
//! Multi-tenant note service built around revocable bearer sessions.
//!
//! # Features
//!
//! - **Session Authority**: signup/login/logout with HS256 bearer tokens
//! - **Request Gate**: per-request verification middleware with an explicit
//!   public-path table
//! - **Revocation Cache**: TTL blacklist so logout kills a token before it
//!   expires
//! - **Notes**: per-user CRUD with soft-delete, substring search and
//!   note-to-user sharing

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod notes;
pub mod server;
pub mod store;
pub mod users;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
