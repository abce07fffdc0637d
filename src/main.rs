use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cliniflow::api::server::start_server;
use cliniflow::api::types::ApiContext;
use cliniflow::auth::TokenSigner;
use cliniflow::config::{self, Config};
use cliniflow::db::Db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env();

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Db::open(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "database ready");

    let tokens = Arc::new(TokenSigner::new(
        config.token_secret.clone(),
        chrono::Duration::hours(config.token_ttl_hours),
    ));

    let mut server = start_server(ApiContext::new(db, tokens), config.bind_addr).await?;
    tracing::info!(
        addr = %server.addr,
        version = config::APP_VERSION,
        "{} listening",
        config::APP_NAME
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown();

    Ok(())
}
