//! Telemetry broker
//!
//! Usage: `telemetry-broker [-l ADDR]`. The listen address defaults to
//! `0.0.0.0:8080` and can also be set with `TELEMETRY_SERVER__LISTEN_ADDR`.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use telemetry_broker::broker::Broker;
use telemetry_broker::config::load_config_with_listen;
use telemetry_broker::transport::start_tcp_server;
use telemetry_broker::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "telemetry-broker", version, about)]
struct Cli {
    /// Address and port to listen on (e.g. 0.0.0.0:8080)
    #[arg(short = 'l', long = "listen", value_name = "ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_config_with_listen(cli.listen)?;
    logging::init(&settings.logging.level);

    let broker = Broker::from_settings(&settings.broker);

    tokio::select! {
        result = start_tcp_server(&settings, broker) => {
            if let Err(e) = result {
                error!("broker failed: {e}");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
        }
    }

    Ok(())
}
