//! Application configuration: constants, data directory, and the
//! environment-driven runtime settings.

use std::net::SocketAddr;
use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

pub const APP_NAME: &str = "Cliniflow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracing filter used when RUST_LOG is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,cliniflow=debug,tower_http=debug";

/// Get the application data directory: ~/Cliniflow/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Runtime settings, read from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub token_secret: Vec<u8>,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("CLINIFLOW_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

        let db_path = std::env::var("CLINIFLOW_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir().join("cliniflow.db"));

        let token_secret = match std::env::var("CLINIFLOW_TOKEN_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                // Ephemeral secret: tokens stop verifying across restarts
                tracing::warn!(
                    "CLINIFLOW_TOKEN_SECRET not set, generating an ephemeral signing key"
                );
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                URL_SAFE_NO_PAD.encode(bytes).into_bytes()
            }
        };

        let token_ttl_hours = std::env::var("CLINIFLOW_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            bind_addr,
            db_path,
            token_secret,
            token_ttl_hours,
        }
    }
}
