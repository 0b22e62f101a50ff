//! One accepted connection: a reader task that feeds the router and a writer
//! task that drains the client's outbound queue onto the socket.
//!
//! The registry's `Client` holds the queue sender and the reader's shutdown
//! signal. Once it is removed, the writer sees its queue close and shuts the
//! write half down, and the reader stops on the signal. Either task noticing
//! a dead socket first removes the client, which tears down the other. The
//! reader removes the client on every exit path, a panic included.

use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::broker::{Broker, Router};
use crate::client::{Client, ClientId};
use crate::transport::framing::FrameReader;

/// Registers the connection with the broker and starts its reader and writer.
///
/// Registration completes before this returns, so no frame from the
/// connection can be routed ahead of it.
pub fn spawn_connection(
    stream: TcpStream,
    peer: SocketAddr,
    client_id: ClientId,
    broker: Broker,
    max_frame_bytes: usize,
) {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let (stop_tx, stop_rx) = oneshot::channel();

    broker.add_client(Client::new(client_id.clone(), tx).with_shutdown(stop_tx));
    debug!(client_id = %client_id, %peer, "connection accepted");

    tokio::spawn(write_loop(
        client_id.clone(),
        write_half,
        rx,
        broker.clone(),
    ));
    tokio::spawn(read_loop(
        client_id,
        read_half,
        stop_rx,
        broker,
        max_frame_bytes,
    ));
}

async fn write_loop(
    client_id: ClientId,
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    broker: Broker,
) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(client_id = %client_id, "failed to write to client: {e}");
            broker.remove_client(&client_id);
            break;
        }
    }

    let _ = writer.shutdown().await;
    debug!(client_id = %client_id, "send loop closed");
}

async fn read_loop(
    client_id: ClientId,
    read_half: OwnedReadHalf,
    mut stop_rx: oneshot::Receiver<()>,
    broker: Broker,
    max_frame_bytes: usize,
) {
    let _cleanup = RemoveOnDrop {
        broker: broker.clone(),
        client_id: client_id.clone(),
    };
    let router = Router::new(broker);
    let mut frames = FrameReader::new(BufReader::new(read_half), max_frame_bytes);

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!(client_id = %client_id, "reader stopped after removal");
                break;
            }
            frame = frames.next_frame() => match frame {
                Ok(Some(line)) => {
                    router.route(&client_id, line);
                }
                Ok(None) => {
                    info!(client_id = %client_id, "client closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(client_id = %client_id, "read failed: {e}");
                    break;
                }
            }
        }
    }
}

/// Unregisters the client when the reader ends, whether it returns or
/// unwinds.
struct RemoveOnDrop {
    broker: Broker,
    client_id: ClientId,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        self.broker.remove_client(&self.client_id);
    }
}
