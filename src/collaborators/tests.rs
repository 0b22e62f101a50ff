use std::time::Duration;

use chrono::{Local, TimeDelta};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::net::TcpListener;

use super::irrigation::{Decision, IrrigationSystem};
use super::link::{connect_with_retry, send_frame};
use super::probe::fetch_current;
use super::sensor::{Sensor, SensorKind, run_sensor};
use crate::broker::{Broker, Frame};
use crate::transport::serve;

/// Every draw yields exactly 0.5 from `gen::<f64>()`: zero noise, no trend flip.
struct Midpoint;

impl RngCore for Midpoint {
    fn next_u32(&mut self) -> u32 {
        1 << 31
    }

    fn next_u64(&mut self) -> u64 {
        1 << 63
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0x80);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn sensor(current: f64, trend: f64) -> Sensor {
    Sensor {
        name: "test",
        topic: "humidity",
        min: 0.0,
        max: 100.0,
        current,
        trend,
        unit: "%",
    }
}

#[test]
fn test_presets_start_inside_their_range() {
    let mut rng = StdRng::seed_from_u64(7);
    for kind in [SensorKind::Humidity, SensorKind::Temperature, SensorKind::Wind] {
        for _ in 0..100 {
            let s = Sensor::preset(kind, &mut rng);
            assert_eq!(s.topic, kind.topic());
            assert!(s.current >= s.min && s.current <= s.max, "{s:?}");
        }
    }
}

#[test]
fn test_readings_stay_in_range_and_are_rounded() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut s = Sensor::preset(SensorKind::Wind, &mut rng);
    for _ in 0..10_000 {
        let reading = s.generate_reading(&mut rng);
        assert!((s.min..=s.max).contains(&reading));
        let cents = reading * 100.0;
        assert!((cents - cents.round()).abs() < 1e-6);
    }
}

#[test]
fn test_reading_follows_trend_without_noise() {
    let mut s = sensor(50.0, 1.25);
    assert_eq!(s.generate_reading(&mut Midpoint), 51.25);
    assert_eq!(s.generate_reading(&mut Midpoint), 52.5);
}

#[test]
fn test_reading_clamps_and_turns_back_at_the_edges() {
    let mut s = sensor(99.5, 2.0);
    assert_eq!(s.generate_reading(&mut Midpoint), 100.0);
    assert_eq!(s.trend, -2.0);
    assert_eq!(s.generate_reading(&mut Midpoint), 98.0);

    let mut s = sensor(0.5, -2.0);
    assert_eq!(s.generate_reading(&mut Midpoint), 0.0);
    assert_eq!(s.trend, 2.0);
}

#[test]
fn test_threshold_depends_on_temperature() {
    let mut system = IrrigationSystem::new();
    assert_eq!(system.min_humidity(), 40.0);

    system.process("temperature", 31.0, Local::now());
    assert_eq!(system.min_humidity(), 60.0);

    system.process("temperature", 14.9, Local::now());
    assert_eq!(system.min_humidity(), 30.0);

    system.process("temperature", 30.0, Local::now());
    assert_eq!(system.min_humidity(), 40.0);
}

#[test]
fn test_dry_soil_activates_and_wet_soil_deactivates() {
    let mut system = IrrigationSystem::new();
    let start = Local::now();

    assert_eq!(system.process("humidity", 35.0, start), Decision::Activated);
    assert!(system.is_active);
    assert_eq!(system.total_activations, 1);

    assert_eq!(
        system.process("humidity", 60.0, start + TimeDelta::minutes(1)),
        Decision::Unchanged
    );
    assert!(system.is_active);

    assert_eq!(
        system.process("humidity", 80.0, start + TimeDelta::minutes(2)),
        Decision::Deactivated
    );
    assert!(!system.is_active);
}

#[test]
fn test_reactivation_waits_for_the_minimum_interval() {
    let mut system = IrrigationSystem::new();
    let start = Local::now();

    system.process("humidity", 10.0, start);
    system.process("humidity", 85.0, start + TimeDelta::minutes(1));

    assert_eq!(
        system.process("humidity", 10.0, start + TimeDelta::minutes(3)),
        Decision::Waiting
    );
    assert!(!system.is_active);

    assert_eq!(
        system.process("humidity", 10.0, start + TimeDelta::minutes(5)),
        Decision::Activated
    );
    assert_eq!(system.total_activations, 2);
}

#[test]
fn test_hot_weather_raises_the_bar() {
    let mut system = IrrigationSystem::new();
    let now = Local::now();
    assert_eq!(system.process("humidity", 50.0, now), Decision::Unchanged);

    system.process("temperature", 35.0, now);
    assert_eq!(system.process("humidity", 50.0, now), Decision::Activated);
}

#[test]
fn test_unrelated_topics_are_ignored() {
    let mut system = IrrigationSystem::new();
    assert_eq!(system.process("wind", 5.0, Local::now()), Decision::Unchanged);
    assert!(system.to_string().contains("idle"));
}

async fn start_broker() -> (String, Broker) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let broker = Broker::new();
    tokio::spawn(serve(listener, broker.clone(), 1024));
    (addr, broker)
}

#[tokio::test]
async fn test_fetch_current_reads_values() {
    let (addr, broker) = start_broker().await;

    let mut sensor = connect_with_retry(&addr, Duration::from_millis(10)).await;
    send_frame(&mut sensor, &Frame::sensor_data("humidity", 44.5))
        .await
        .unwrap();
    send_frame(&mut sensor, &Frame::sensor_data("wind", 12.0))
        .await
        .unwrap();
    for _ in 0..200 {
        if broker.snapshot().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let readings = fetch_current(&addr, Duration::from_millis(300)).await.unwrap();
    assert_eq!(readings.len(), 2);
    assert_eq!(readings["humidity"], 44.5);
    assert_eq!(readings["wind"], 12.0);
}

#[tokio::test]
async fn test_fetch_current_on_empty_broker_returns_nothing() {
    let (addr, _broker) = start_broker().await;
    let readings = fetch_current(&addr, Duration::from_millis(200)).await.unwrap();
    assert!(readings.is_empty());
}

#[tokio::test]
async fn test_sensor_reconnects_after_broker_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let first = Broker::new();
    let server = tokio::spawn(serve(listener, first.clone(), 1024));

    let sensor = Sensor::preset(SensorKind::Humidity, &mut StdRng::seed_from_u64(3));
    let sensor_addr = addr.clone();
    let sensor_task = tokio::spawn(async move {
        run_sensor(&sensor_addr, sensor, Duration::from_millis(50)).await;
    });

    for _ in 0..200 {
        if first.snapshot().contains_key("humidity") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let publisher = first.history("humidity")[0].client_id.clone();

    // Stop accepting, then drop the sensor's live connection.
    server.abort();
    let _ = server.await;
    first.remove_client(&publisher);

    let listener = TcpListener::bind(&addr).await.unwrap();
    let second = Broker::new();
    tokio::spawn(serve(listener, second.clone(), 1024));

    let mut resumed = false;
    for _ in 0..600 {
        if second.snapshot().contains_key("humidity") {
            resumed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sensor_task.abort();

    assert!(resumed, "sensor did not resume publishing");
    assert!(!first.is_registered(&publisher));
}
