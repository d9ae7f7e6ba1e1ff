use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use fleet_dashboard::config::DashboardConfig;
use fleet_dashboard::dashboard::Dashboard;
use fleet_dashboard::logging;
use fleet_dashboard::web::{self, WebConfig};

#[derive(Parser)]
#[command(name = "fleet-dashboard")]
#[command(about = "Live status of an agent fleet, read from its session logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: nearest .dashboard.toml, then ~/.config/fleet-dashboard/)
    #[arg(long, short = 'c', env = "DASHBOARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (default: from config)
        #[arg(long, env = "DASHBOARD_HOST")]
        host: Option<String>,
        /// Port to listen on (default: from config)
        #[arg(long, short, env = "DASHBOARD_PORT")]
        port: Option<u16>,
        /// Require this bearer token on API requests
        #[arg(long, env = "DASHBOARD_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
    },
    /// Print the aggregated activity feed
    Activity {
        /// Maximum entries to print (default: from config)
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Print every agent's status
    Agents,
    /// Print the business snapshot
    Snapshot,
    /// Print the memory digest
    Memory,
    /// Print host stats and companion service reachability
    Health,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => DashboardConfig::load_from_path(path)?,
        None => DashboardConfig::load()?,
    };
    let dashboard = Dashboard::from_config(&config).context("Invalid configuration")?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            api_token,
        } => {
            let web_config = WebConfig {
                host: host.unwrap_or(config.server.host),
                port: port.unwrap_or(config.server.port),
                api_token,
            };
            web::serve(web_config, dashboard).await?;
        }
        Commands::Activity { limit } => {
            let feed = match limit {
                Some(limit) => dashboard.activity_with_cap(limit).await,
                None => dashboard.activity().await,
            };
            print_json(&feed)?;
        }
        Commands::Agents => {
            print_json(&dashboard.agent_statuses().await)?;
        }
        Commands::Snapshot => {
            print_json(&dashboard.snapshot().await?)?;
        }
        Commands::Memory => {
            print_json(&dashboard.memory().await?)?;
        }
        Commands::Health => {
            print_json(&dashboard.system_health().await?)?;
        }
    }

    Ok(())
}
