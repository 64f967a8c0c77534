//! NATS connection management

use async_nats::Client;
use tracing::{info, warn};

use crate::config::{NatsAuth, NatsConfig};
use crate::error::{Error, Result};

/// Connect to NATS server(s). The initial connect is not retried; an
/// unreachable store is fatal at startup.
pub async fn connect(config: &NatsConfig) -> Result<Client> {
    info!("Connecting to NATS servers: {:?}", config.servers);

    if config.servers.is_empty() {
        return Err(Error::Connection("no NATS servers configured".to_string()));
    }
    if !config.prefix_is_valid() {
        return Err(Error::Connection(format!("invalid bucket prefix '{}'", config.prefix)));
    }

    let mut opts = async_nats::ConnectOptions::new().name("maw-bot");

    opts = match config.auth() {
        NatsAuth::Credentials(file) => opts
            .credentials_file(file)
            .await
            .map_err(|e| Error::Connection(format!("Failed to load credentials: {}", e)))?,
        NatsAuth::UserPassword { user, password } => {
            opts.user_and_password(user.to_string(), password.to_string())
        }
        NatsAuth::Anonymous => opts,
    };

    opts = opts
        .event_callback(|event| async move {
            match event {
                async_nats::Event::Connected => info!("Connected to NATS"),
                async_nats::Event::Disconnected => warn!("Disconnected from NATS"),
                async_nats::Event::ClientError(e) => warn!("NATS client error: {}", e),
                _ => {}
            }
        })
        .max_reconnects(None);

    let servers: Vec<&str> = config.servers.iter().map(|s| s.as_str()).collect();
    let client = opts
        .connect(servers)
        .await
        .map_err(|e| Error::Connection(format!("Failed to connect to NATS: {}", e)))?;

    info!("Successfully connected to NATS");
    Ok(client)
}
