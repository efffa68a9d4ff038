//! CLI entry point for wolweb: manage the device registry and scan the LAN.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use wolweb_core::config::WolwebConfig;
use wolweb_core::{Device, DeviceId};
use wolweb_registry::{JsonFileStore, LivenessProber, Registry};

use wolweb_discover::scanner::NetworkScanner;
use wolweb_discover::system::{SystemInterfaces, SystemNeighborTable, SystemPing};

#[derive(Parser)]
#[command(name = "wolweb")]
#[command(about = "Wake-on-LAN device registry and network discovery")]
struct Cli {
    /// Config file prefix (default: wolweb).
    #[arg(short, long, default_value = "wolweb", global = true)]
    config: String,

    /// Human-readable logs instead of JSON.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered devices.
    List {
        /// Probe every device before listing.
        #[arg(long)]
        refresh: bool,
    },
    /// Show one device.
    Show { id: String },
    /// Register a device.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        mac: String,
        #[arg(long, default_value = "")]
        ip: String,
        /// Wake target port (default: 9).
        #[arg(long, default_value = "")]
        port: String,
    },
    /// Remove a device by id.
    Remove { id: String },
    /// Probe every registered device and store the results.
    Refresh,
    /// Discover devices on the local subnet.
    Scan,
    /// Print local IPv4 interfaces.
    Interfaces,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.pretty {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    }

    let config = wolweb_core::config::load(&cli.config)?;

    match cli.command {
        Command::Interfaces => {
            for (name, net) in SystemInterfaces.named_ipv4_networks() {
                println!("{name}\t{net}");
            }
        }
        Command::Scan => {
            let scanner = NetworkScanner::new(
                Arc::new(SystemInterfaces),
                Arc::new(SystemPing),
                Arc::new(SystemNeighborTable),
                config.scanner.clone(),
            );
            let found = scanner.scan().await?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::List { refresh } => {
            let registry = open_registry(&config)?;
            if refresh {
                prober(&registry, &config).update_statuses().await;
            }
            println!("{}", serde_json::to_string_pretty(&registry.list())?);
        }
        Command::Show { id } => {
            let device = open_registry(&config)?.get(&DeviceId(id))?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }
        Command::Add {
            name,
            mac,
            ip,
            port,
        } => {
            let device = open_registry(&config)?.add(Device::new(&name, &mac, &ip, &port))?;
            println!("{}", serde_json::to_string_pretty(&device)?);
        }
        Command::Remove { id } => {
            let removed = open_registry(&config)?.remove(&DeviceId(id))?;
            tracing::info!(id = %removed.id, name = %removed.name, "Device deleted");
        }
        Command::Refresh => {
            let registry = open_registry(&config)?;
            let summary = prober(&registry, &config).update_statuses().await;
            println!(
                "probed={} online={} offline={}",
                summary.probed, summary.online, summary.offline
            );
        }
    }

    Ok(())
}

fn open_registry(config: &WolwebConfig) -> anyhow::Result<Arc<Registry>> {
    tracing::info!(path = %config.devices_file.display(), "Opening device store");
    let registry = Registry::open(JsonFileStore::new(&config.devices_file))?;
    Ok(Arc::new(registry))
}

fn prober(registry: &Arc<Registry>, config: &WolwebConfig) -> LivenessProber {
    LivenessProber::new(Arc::clone(registry), Arc::new(SystemPing), &config.prober)
}
