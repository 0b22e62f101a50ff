//! Irrigation controller.
//!
//! Keeps the latest humidity and temperature and switches irrigation on when
//! the soil is too dry for the current temperature, off once it is wet enough.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::broker::{Frame, MessageType};
use crate::collaborators::link::{
    RECONNECT_DELAY, connect_with_retry, frames, recv_frame, send_frame,
};

pub const TOPICS: [&str; 2] = ["humidity", "temperature"];

/// How often the controller logs its status.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Activated,
    Deactivated,
    /// Irrigation is needed but the minimum interval has not passed.
    Waiting,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct IrrigationSystem {
    pub is_active: bool,
    pub max_humidity: f64,
    pub current_humidity: f64,
    pub current_temperature: f64,
    pub last_activation: Option<DateTime<Local>>,
    pub min_interval: TimeDelta,
    pub total_activations: u32,
}

impl Default for IrrigationSystem {
    fn default() -> Self {
        Self {
            is_active: false,
            max_humidity: 80.0,
            current_humidity: 0.0,
            current_temperature: 25.0,
            last_activation: None,
            min_interval: TimeDelta::minutes(5),
            total_activations: 0,
        }
    }
}

impl IrrigationSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Humidity below which irrigation is wanted: stricter on hot days,
    /// looser on cold ones.
    pub fn min_humidity(&self) -> f64 {
        if self.current_temperature > 30.0 {
            60.0
        } else if self.current_temperature < 15.0 {
            30.0
        } else {
            40.0
        }
    }

    /// Applies one reading received at `now`.
    pub fn process(&mut self, topic: &str, value: f64, now: DateTime<Local>) -> Decision {
        match topic {
            "humidity" => {
                self.current_humidity = value;
                self.evaluate(now)
            }
            "temperature" => {
                self.current_temperature = value;
                Decision::Unchanged
            }
            _ => Decision::Unchanged,
        }
    }

    fn evaluate(&mut self, now: DateTime<Local>) -> Decision {
        let threshold = self.min_humidity();

        if !self.is_active && self.current_humidity < threshold {
            let rested = self
                .last_activation
                .is_none_or(|last| now - last >= self.min_interval);
            if !rested {
                info!(
                    humidity = self.current_humidity,
                    "irrigation needed, waiting for minimum interval"
                );
                return Decision::Waiting;
            }

            self.is_active = true;
            self.last_activation = Some(now);
            self.total_activations += 1;
            info!(
                humidity = self.current_humidity,
                threshold,
                activation = self.total_activations,
                "irrigation activated"
            );
            return Decision::Activated;
        }

        if self.is_active && self.current_humidity >= self.max_humidity {
            self.is_active = false;
            let ran_for = self.last_activation.map(|last| now - last);
            info!(
                humidity = self.current_humidity,
                max = self.max_humidity,
                ran_for_secs = ran_for.map(|d| d.num_seconds()),
                "irrigation deactivated"
            );
            return Decision::Deactivated;
        }

        Decision::Unchanged
    }
}

impl fmt::Display for IrrigationSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_active { "active" } else { "idle" };
        write!(
            f,
            "irrigation {state}: humidity {:.1}% (min {:.1}%, max {:.1}%), temperature {:.1}°C, {} activations",
            self.current_humidity,
            self.min_humidity(),
            self.max_humidity,
            self.current_temperature,
            self.total_activations,
        )?;
        if let Some(last) = self.last_activation {
            write!(f, ", last at {}", last.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}

/// Subscribes to humidity and temperature and reacts to readings forever,
/// reconnecting and resubscribing whenever the broker goes away.
pub async fn run_irrigation(addr: &str) {
    let mut system = IrrigationSystem::new();
    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;

    loop {
        let stream = connect_with_retry(addr, RECONNECT_DELAY).await;
        let (read_half, mut write_half) = stream.into_split();

        let mut subscribed = true;
        for topic in TOPICS {
            if let Err(e) = send_frame(&mut write_half, &Frame::subscribe(topic)).await {
                warn!(topic, "failed to subscribe: {e}");
                subscribed = false;
                break;
            }
            info!(topic, "subscribed");
        }
        if !subscribed {
            continue;
        }

        let mut reader = frames(BufReader::new(read_half));
        loop {
            tokio::select! {
                _ = status.tick() => info!("{system}"),
                frame = recv_frame(&mut reader) => match frame {
                    Ok(Some(frame)) if frame.kind == MessageType::SensorData => {
                        info!("{}: {:.1}", frame.topic, frame.data);
                        system.process(&frame.topic, frame.data, Local::now());
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        warn!("broker closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("read failed: {e}");
                        break;
                    }
                }
            }
        }
    }
}
