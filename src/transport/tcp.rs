//! TCP listener
//!
//! Accepts connections forever. Each accepted socket gets a fresh client id,
//! is registered with the broker and handed to its own reader/writer tasks.
//! There is no connection limit. An accept error is logged and the loop keeps
//! going; only failing to bind is fatal.

use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broker::Broker;
use crate::client::ClientIdGenerator;
use crate::config::Settings;
use crate::transport::connection::spawn_connection;
use crate::utils::{BrokerError, Result};

/// Pause after a failed accept, so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Binds `settings.server.listen_addr` and serves until the task is dropped.
pub async fn start_tcp_server(settings: &Settings, broker: Broker) -> Result<()> {
    let addr = settings.server.listen_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| BrokerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(%addr, "telemetry broker listening");
    serve(listener, broker, settings.broker.max_frame_bytes).await;
    Ok(())
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(listener: TcpListener, broker: Broker, max_frame_bytes: usize) {
    let mut ids = ClientIdGenerator::default();

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn_connection(stream, peer, ids.next_id(), broker.clone(), max_frame_bytes);
            }
            Err(e) => {
                error!("failed to accept connection: {e}");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}
