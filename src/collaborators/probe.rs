//! One-shot read of every topic's current value, as a dashboard would do it.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpStream;

use crate::broker::{Frame, MessageType};
use crate::collaborators::link::{frames, recv_frame, send_frame};
use crate::utils::Result;

/// Sends `get_current` and collects `sensor_data` answers until `wait`
/// elapses or the broker hangs up.
pub async fn fetch_current(addr: &str, wait: Duration) -> Result<BTreeMap<String, f64>> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    send_frame(&mut write_half, &Frame::get_current()).await?;

    let mut readings = BTreeMap::new();
    let mut reader = frames(BufReader::new(read_half));
    let deadline = tokio::time::sleep(wait);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            frame = recv_frame(&mut reader) => match frame? {
                Some(frame) if frame.kind == MessageType::SensorData => {
                    readings.insert(frame.topic, frame.data);
                }
                Some(_) => {}
                None => break,
            }
        }
    }
    Ok(readings)
}
