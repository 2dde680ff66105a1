//! `device-router`: redirects device sessions to the node that owns them.
//!
//! # Usage
//!
//! ```text
//! device-router serve -c router.toml                 # run the router
//! device-router serve --self-address talaria-0:6200  # override identity
//! device-router lookup mac:112233445566 -c router.toml
//! device-router inspect --json -c router.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use device_router::{commands, server, telemetry, Failure, RouterConfig};
use tracing::error;

#[derive(Parser)]
#[command(
    name = "device-router",
    version,
    about = "Consistent-hash redirect router for device sessions"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the router.
    Serve {
        /// Override the redirect listen address.
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Override this router's own instance address.
        #[arg(long)]
        self_address: Option<String>,

        /// Override the log level.
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Show which instance owns a device.
    Lookup {
        /// Device name, e.g. `mac:112233445566`.
        device: String,
    },

    /// Show each instance's share of the ring.
    Inspect {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(code = failure.code(), "{failure}");
            eprintln!("device-router: {failure}");
            ExitCode::from(&failure)
        }
    }
}

async fn run(cli: Cli) -> Result<(), Failure> {
    let mut config = RouterConfig::load(cli.config.as_deref()).map_err(Failure::Config)?;

    match cli.command {
        Commands::Serve {
            listen,
            self_address,
            log_level,
        } => {
            // CLI args override config file values.
            if let Some(addr) = listen {
                config.server.listen_addr = addr;
            }
            if let Some(addr) = self_address {
                config.server.self_address = Some(addr);
            }
            if let Some(level) = log_level {
                config.log.level = level;
            }
            config.validate().map_err(Failure::Config)?;

            telemetry::init(&config.log.level);
            server::run(config).await
        }
        Commands::Lookup { device } => {
            let members = server::load_membership(&config.discovery)
                .await
                .map_err(Failure::Discovery)?;
            let report = commands::lookup(&members, &config.ring, &device)
                .map_err(Failure::Config)?;
            println!("{} -> {} (token {})", report.device, report.owner, report.token);
            Ok(())
        }
        Commands::Inspect { json } => {
            let members = server::load_membership(&config.discovery)
                .await
                .map_err(Failure::Discovery)?;
            let report = commands::inspect(&members, &config.ring);
            if json {
                let out = serde_json::to_string_pretty(&report)
                    .context("failed to encode report")
                    .map_err(Failure::Server)?;
                println!("{out}");
            } else {
                print!("{}", report.render());
            }
            Ok(())
        }
    }
}
