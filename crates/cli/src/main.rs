use clap::Parser;
use ferrous_rproxy_domain::{BackendAddr, CliOverrides};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "ferrous-rproxy")]
#[command(version)]
#[command(about = "Ferrous RProxy - DNS reverse proxy routing queries to authoritative backends")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Bind address
    #[arg(short = 'a', long)]
    bind: Option<String>,

    /// Listen port (UDP and TCP)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Backend for names no route matches, as host:port
    #[arg(long = "default", value_name = "HOST:PORT")]
    default_backend: Option<String>,

    /// Directory holding BIND signing keys
    #[arg(long, value_name = "DIR")]
    key_dir: Option<PathBuf>,

    /// Comma-separated client addresses allowed to transfer zones
    #[arg(long, value_delimiter = ',')]
    allow_transfer: Option<Vec<IpAddr>>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_backend = cli
        .default_backend
        .as_deref()
        .map(str::parse::<BackendAddr>)
        .transpose()?;

    let cli_overrides = CliOverrides {
        bind_address: cli.bind,
        port: cli.port,
        default_backend,
        key_directory: cli.key_dir,
        allow_transfer: cli.allow_transfer,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting Ferrous RProxy v{}", env!("CARGO_PKG_VERSION"));

    let services = di::DnsServices::new(&config)?;

    server::start_dns_server(&config.server, services.handler).await?;

    info!("Server shutdown complete");
    Ok(())
}
