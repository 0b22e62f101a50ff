use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use super::framing::FrameReader;
use super::{serve, start_tcp_server};
use crate::broker::Broker;
use crate::config::Settings;
use crate::utils::BrokerError;

const MAX_FRAME: usize = 1024;

async fn start_broker() -> (SocketAddr, Broker) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broker = Broker::new();
    tokio::spawn(serve(listener, broker.clone(), MAX_FRAME));
    (addr, broker)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn send(&mut self, frame: Value) {
        let mut line = frame.to_string();
        line.push('\n');
        self.send_raw(line.as_bytes()).await;
    }

    async fn recv(&mut self) -> Value {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(2), self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a frame")
            .unwrap();
        assert!(n > 0, "connection closed");
        serde_json::from_str(line.trim_end()).unwrap()
    }

    async fn expect_silence(&mut self) {
        let mut line = String::new();
        let read = timeout(Duration::from_millis(200), self.reader.read_line(&mut line)).await;
        assert!(read.is_err(), "unexpected frame: {line}");
    }
}

#[tokio::test]
async fn test_frame_reader_splits_lines() {
    let input: &[u8] = b"{\"a\":1}\r\n\n{\"b\":2}\ntail";
    let mut frames = FrameReader::new(input, MAX_FRAME);

    assert_eq!(frames.next_frame().await.unwrap(), Some(&b"{\"a\":1}"[..]));
    assert_eq!(frames.next_frame().await.unwrap(), Some(&b""[..]));
    assert_eq!(frames.next_frame().await.unwrap(), Some(&b"{\"b\":2}"[..]));
    assert_eq!(frames.next_frame().await.unwrap(), Some(&b"tail"[..]));
    assert_eq!(frames.next_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_frame_reader_limits_length() {
    let exact: &[u8] = b"12345\n";
    let mut frames = FrameReader::new(exact, 5);
    assert_eq!(frames.next_frame().await.unwrap(), Some(&b"12345"[..]));

    let long: &[u8] = b"123456\n";
    let mut frames = FrameReader::new(long, 5);
    let err = frames.next_frame().await.unwrap_err();
    assert!(matches!(err, BrokerError::FrameTooLong { limit: 5 }));
}

#[tokio::test]
async fn test_frame_reader_accepts_unbounded_limit() {
    let input: &[u8] = b"{\"type\":\"get_current\"}\n";
    let mut frames = FrameReader::new(input, usize::MAX);
    assert_eq!(
        frames.next_frame().await.unwrap(),
        Some(&b"{\"type\":\"get_current\"}"[..])
    );
    assert_eq!(frames.next_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_frame_reader_resumes_partial_lines() {
    let (mut client_write, server) = tokio::io::duplex(64);
    let mut frames = FrameReader::new(BufReader::new(server), MAX_FRAME);

    client_write.write_all(b"{\"type\":").await.unwrap();
    let pending = timeout(Duration::from_millis(50), frames.next_frame()).await;
    assert!(pending.is_err());

    client_write.write_all(b"\"get_current\"}\n").await.unwrap();
    let line = frames.next_frame().await.unwrap().unwrap();
    assert_eq!(line, b"{\"type\":\"get_current\"}");
}

#[tokio::test]
async fn test_publish_reaches_subscriber_with_publisher_id() {
    let (addr, broker) = start_broker().await;
    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;

    a.send(json!({ "type": "subscribe", "topic": "humidity" })).await;
    wait_until(|| broker.subscribers("humidity").len() == 1).await;

    b.send(json!({ "type": "sensor_data", "topic": "humidity", "data": 55.0 }))
        .await;

    let frame = a.recv().await;
    assert_eq!(frame["type"], "sensor_data");
    assert_eq!(frame["topic"], "humidity");
    assert_eq!(frame["data"], 55.0);
    assert!(frame["timestamp"].is_string());

    let publisher = frame["client_id"].as_str().unwrap().to_string();
    assert!(publisher.starts_with("client_"));
    assert_eq!(broker.is_publisher(&publisher), Some(true));
    assert_ne!(broker.subscribers("humidity")[0], publisher);
    b.expect_silence().await;
}

#[tokio::test]
async fn test_get_current_with_no_data_is_silent() {
    let (addr, _broker) = start_broker().await;
    let mut c = TestClient::connect(addr).await;
    c.send(json!({ "type": "get_current" })).await;
    c.expect_silence().await;
}

#[tokio::test]
async fn test_get_current_and_late_join_over_tcp() {
    let (addr, broker) = start_broker().await;
    let mut sensor = TestClient::connect(addr).await;
    sensor
        .send(json!({ "type": "sensor_data", "topic": "temperature", "data": 24.5 }))
        .await;
    wait_until(|| broker.snapshot().contains_key("temperature")).await;

    let mut dashboard = TestClient::connect(addr).await;
    dashboard.send(json!({ "type": "get_current" })).await;
    let frame = dashboard.recv().await;
    assert_eq!(frame["topic"], "temperature");
    assert_eq!(frame["data"], 24.5);
    assert_eq!(frame["client_id"], "broker");

    let mut late = TestClient::connect(addr).await;
    late.send(json!({ "type": "subscribe", "topic": "temperature" }))
        .await;
    let replay = late.recv().await;
    assert_eq!(replay["data"], 24.5);
    assert_eq!(replay["client_id"], "broker");
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let (addr, broker) = start_broker().await;
    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;

    a.send_raw(b"this is not json\n").await;
    a.send(json!({ "type": "launch_rockets", "topic": "humidity" }))
        .await;
    a.send(json!({ "type": "subscribe", "topic": "wind" })).await;
    wait_until(|| broker.subscribers("wind").len() == 1).await;

    b.send(json!({ "type": "sensor_data", "topic": "wind", "data": 12.0 }))
        .await;
    assert_eq!(a.recv().await["data"], 12.0);
}

#[tokio::test]
async fn test_forged_identity_is_replaced() {
    let (addr, broker) = start_broker().await;
    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;
    a.send(json!({ "type": "subscribe", "topic": "humidity" })).await;
    wait_until(|| broker.subscribers("humidity").len() == 1).await;

    b.send(json!({
        "type": "sensor_data",
        "topic": "humidity",
        "data": 1.0,
        "timestamp": "2001-01-01T00:00:00Z",
        "client_id": "sensor_humidity"
    }))
    .await;

    let frame = a.recv().await;
    assert_ne!(frame["client_id"], "sensor_humidity");
    assert_ne!(frame["timestamp"], "2001-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_disconnect_removes_subscriptions() {
    let (addr, broker) = start_broker().await;
    let mut a = TestClient::connect(addr).await;
    a.send(json!({ "type": "subscribe", "topic": "humidity" })).await;
    a.send(json!({ "type": "subscribe", "topic": "temperature" }))
        .await;
    wait_until(|| broker.subscribers("temperature").len() == 1).await;
    assert_eq!(broker.client_count(), 1);

    drop(a);
    wait_until(|| broker.client_count() == 0).await;
    assert!(broker.subscribers("humidity").is_empty());
    assert!(broker.subscribers("temperature").is_empty());
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let (addr, broker) = start_broker().await;
    let mut a = TestClient::connect(addr).await;
    wait_until(|| broker.client_count() == 1).await;

    a.send_raw(&vec![b'x'; MAX_FRAME * 2]).await;
    wait_until(|| broker.client_count() == 0).await;

    let mut rest = Vec::new();
    let read = timeout(Duration::from_secs(2), a.reader.read_to_end(&mut rest)).await;
    assert!(read.is_ok(), "server did not close the connection");
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut settings = Settings::default();
    settings.server.listen_addr = taken.local_addr().unwrap().to_string();

    let err = start_tcp_server(&settings, Broker::new()).await.unwrap_err();
    assert!(matches!(err, BrokerError::Bind { .. }));
}

#[tokio::test]
async fn test_unbounded_frame_limit_still_cleans_up_on_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broker = Broker::new();
    tokio::spawn(serve(listener, broker.clone(), usize::MAX));

    let mut a = TestClient::connect(addr).await;
    a.send(json!({ "type": "subscribe", "topic": "humidity" })).await;
    wait_until(|| broker.subscribers("humidity").len() == 1).await;
    assert_eq!(broker.client_count(), 1);

    drop(a);
    wait_until(|| broker.client_count() == 0).await;
    assert!(broker.subscribers("humidity").is_empty());
}
