//! Simulated sensor publishing to the telemetry broker.
//!
//! Usage: `sensor -t humidity [-b localhost:8080] [--interval 3]`

use std::time::Duration;

use clap::Parser;
use tracing::info;

use telemetry_broker::collaborators::sensor::{Sensor, SensorKind, run_sensor};
use telemetry_broker::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "sensor", version, about)]
struct Cli {
    /// Which sensor to simulate
    #[arg(short = 't', long = "type", value_enum)]
    kind: SensorKind,
    /// Broker address
    #[arg(short = 'b', long = "broker", default_value = "localhost:8080")]
    broker: String,
    /// Seconds between readings
    #[arg(long, default_value_t = 3)]
    interval: u64,
}

#[tokio::main]
async fn main() {
    logging::init("info");
    let cli = Cli::parse();

    let sensor = Sensor::preset(cli.kind, &mut rand::thread_rng());
    info!("starting sensor {sensor}");
    run_sensor(&cli.broker, sensor, Duration::from_secs(cli.interval.max(1))).await;
}
