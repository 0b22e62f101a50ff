//! Irrigation controller driven by humidity and temperature readings.
//!
//! Usage: `irrigation [-b localhost:8080]`

use clap::Parser;
use tracing::info;

use telemetry_broker::collaborators::irrigation::{IrrigationSystem, run_irrigation};
use telemetry_broker::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "irrigation", version, about)]
struct Cli {
    /// Broker address
    #[arg(short = 'b', long = "broker", default_value = "localhost:8080")]
    broker: String,
}

#[tokio::main]
async fn main() {
    logging::init("info");
    let cli = Cli::parse();

    let defaults = IrrigationSystem::new();
    info!(
        max_humidity = defaults.max_humidity,
        min_interval_mins = defaults.min_interval.num_minutes(),
        broker = %cli.broker,
        "starting irrigation controller"
    );
    run_irrigation(&cli.broker).await;
}
