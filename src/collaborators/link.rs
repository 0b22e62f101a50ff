use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::warn;

use crate::broker::Frame;
use crate::transport::framing::FrameReader;
use crate::utils::Result;

/// Fixed delay between connection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Upper bound for frames received from the broker.
pub const MAX_INBOUND_FRAME: usize = 64 * 1024;

/// Dials `addr` until it succeeds, sleeping `delay` after every failure.
pub async fn connect_with_retry(addr: &str, delay: Duration) -> TcpStream {
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return stream,
            Err(e) => {
                warn!(%addr, "broker unreachable, retrying in {delay:?}: {e}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

pub async fn send_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.encode_line()?.as_bytes()).await?;
    Ok(())
}

/// Wraps the read side of a broker connection.
pub fn frames<R>(reader: R) -> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    FrameReader::new(reader, MAX_INBOUND_FRAME)
}

/// Reads frames until one decodes. `Ok(None)` means the broker hung up.
/// Cancel safe.
pub async fn recv_frame<R>(frames: &mut FrameReader<R>) -> Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = frames.next_frame().await? {
        match Frame::decode(line) {
            Ok(frame) => return Ok(Some(frame)),
            Err(e) => warn!("ignoring frame from broker: {e}"),
        }
    }
    Ok(None)
}
