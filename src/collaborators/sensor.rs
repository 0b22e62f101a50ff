//! Simulated field sensor.
//!
//! Readings drift along a trend with uniform noise, stay inside the sensor's
//! range, and occasionally change direction.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::broker::Frame;
use crate::collaborators::link::{RECONNECT_DELAY, connect_with_retry, send_frame};

/// Chance per reading that the trend flips.
const TREND_FLIP_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorKind {
    Humidity,
    Temperature,
    Wind,
}

impl SensorKind {
    pub fn topic(self) -> &'static str {
        match self {
            SensorKind::Humidity => "humidity",
            SensorKind::Temperature => "temperature",
            SensorKind::Wind => "wind",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    pub name: &'static str,
    pub topic: &'static str,
    pub min: f64,
    pub max: f64,
    pub current: f64,
    pub trend: f64,
    pub unit: &'static str,
}

impl Sensor {
    /// A sensor with the preset range for `kind` and a random start.
    pub fn preset<R: Rng>(kind: SensorKind, rng: &mut R) -> Self {
        let spread = |rng: &mut R, width: f64| (rng.r#gen::<f64>() - 0.5) * width;
        match kind {
            SensorKind::Humidity => Sensor {
                name: "soil humidity",
                topic: kind.topic(),
                min: 0.0,
                max: 100.0,
                current: 30.0 + rng.r#gen::<f64>() * 70.0,
                trend: spread(rng, 2.0),
                unit: "%",
            },
            SensorKind::Temperature => Sensor {
                name: "air temperature",
                topic: kind.topic(),
                min: 10.0,
                max: 45.0,
                current: 15.0 + rng.r#gen::<f64>() * 25.0,
                trend: spread(rng, 1.0),
                unit: "°C",
            },
            SensorKind::Wind => Sensor {
                name: "wind speed",
                topic: kind.topic(),
                min: 0.0,
                max: 80.0,
                current: 3.0 + rng.r#gen::<f64>() * 37.0,
                trend: spread(rng, 3.0),
                unit: "km/h",
            },
        }
    }

    /// Advances the simulation one step and returns the new reading,
    /// rounded to two decimals.
    pub fn generate_reading<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let noise = (rng.r#gen::<f64>() - 0.5) * 2.0;
        self.current += self.trend + noise;

        if self.current < self.min {
            self.current = self.min;
            self.trend = self.trend.abs();
        }
        if self.current > self.max {
            self.current = self.max;
            self.trend = -self.trend.abs();
        }

        if rng.r#gen::<f64>() < TREND_FLIP_PROBABILITY {
            self.trend = -self.trend;
        }

        (self.current * 100.0).round() / 100.0
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (topic: {})", self.name, self.topic)
    }
}

/// Publishes a reading every `interval`, forever. A failed write drops the
/// connection and dials again.
pub async fn run_sensor(addr: &str, mut sensor: Sensor, interval: Duration) {
    let mut rng = StdRng::from_entropy();
    let mut stream = connect_with_retry(addr, RECONNECT_DELAY).await;
    info!(sensor = %sensor, every = ?interval, "sensor connected");

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let reading = sensor.generate_reading(&mut rng);
        let frame = Frame::sensor_data(sensor.topic, reading);

        if let Err(e) = send_frame(&mut stream, &frame).await {
            warn!(sensor = %sensor, "failed to send reading: {e}");
            stream = connect_with_retry(addr, RECONNECT_DELAY).await;
            continue;
        }
        info!("{}: {:.2} {}", sensor.name, reading, sensor.unit);
    }
}
