//! Prints every topic's current value, the way a dashboard polls the broker.
//!
//! Usage: `probe [-b localhost:8080] [--wait 2]`

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use telemetry_broker::collaborators::probe::fetch_current;
use telemetry_broker::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "probe", version, about)]
struct Cli {
    /// Broker address
    #[arg(short = 'b', long = "broker", default_value = "localhost:8080")]
    broker: String,
    /// Seconds to wait for answers
    #[arg(long, default_value_t = 2)]
    wait: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("warn");
    let cli = Cli::parse();

    let readings = fetch_current(&cli.broker, Duration::from_secs(cli.wait)).await?;
    if readings.is_empty() {
        println!("no readings yet");
    }
    for (topic, value) in &readings {
        println!("{topic:<15} {value:>10.2}");
    }
    Ok(())
}
