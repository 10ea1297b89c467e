//! EQUIPREG CLI
//!
//! Command-line interface for the EQUIPREG equipment registry.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use equipreg_api::{ApiConfig, ApiServer};
use equipreg_core::constants::DEFAULT_PORT;
use equipreg_core::types::{EquipmentId, Principal};
use equipreg_core::EquipmentError;
use equipreg_registry::{read_journal, FileRegistry, Registry};

/// EQUIPREG - Write-once equipment registry
#[derive(Parser)]
#[command(name = "equipreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register equipment in a journal file
    Register {
        /// Path to the registry journal
        #[arg(short, long, env = "EQUIPREG_REGISTRY_PATH")]
        registry: PathBuf,
        /// Equipment id
        #[arg(long)]
        id: EquipmentId,
        /// Equipment name
        #[arg(long, default_value = "")]
        name: String,
        /// Document reference (e.g. IPFS CID)
        #[arg(long, default_value = "")]
        document_ref: String,
        /// Identity recorded as registrant
        #[arg(long = "as", env = "EQUIPREG_IDENTITY")]
        identity: String,
    },

    /// Show registered equipment
    Show {
        /// Equipment id
        id: EquipmentId,
        /// Path to the registry journal
        #[arg(short, long, env = "EQUIPREG_REGISTRY_PATH")]
        registry: PathBuf,
    },

    /// Print the registration history in commit order
    Events {
        /// Path to the registry journal
        #[arg(short, long, env = "EQUIPREG_REGISTRY_PATH")]
        registry: PathBuf,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
        /// Path to the registry journal (in-memory if omitted)
        #[arg(short, long, env = "EQUIPREG_REGISTRY_PATH")]
        registry: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "equipreg=debug,info"
    } else {
        "equipreg=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Register {
            registry,
            id,
            name,
            document_ref,
            identity,
        } => cmd_register(&registry, id, name, document_ref, &identity).await,
        Commands::Show { id, registry } => cmd_show(&registry, id).await,
        Commands::Events { registry, json } => cmd_events(&registry, json).await,
        Commands::Serve {
            port,
            bind,
            registry,
        } => cmd_serve(port, &bind, registry).await,
    }
}

/// Register equipment
async fn cmd_register(
    path: &Path,
    id: EquipmentId,
    name: String,
    document_ref: String,
    identity: &str,
) -> Result<()> {
    let registrant = Principal::new(identity).context("Invalid registrant identity")?;
    let registry = FileRegistry::open(path)
        .await
        .with_context(|| format!("Failed to open registry {}", path.display()))?;

    println!("{} {}", "📝 Registering equipment".cyan().bold(), id);

    match registry
        .register(id, name.clone(), document_ref.clone(), registrant.clone())
        .await
    {
        Ok(()) => {
            println!("{}", "✅ Registered:".green().bold());
            print_details(id, &name, &registrant, &document_ref);
            Ok(())
        }
        Err(EquipmentError::AlreadyRegistered(_)) => anyhow::bail!("equipment {} is already registered", id),
        Err(e) => Err(e).context("Registration failed"),
    }
}

/// Show equipment details
async fn cmd_show(path: &Path, id: EquipmentId) -> Result<()> {
    let registry = FileRegistry::open(path)
        .await
        .with_context(|| format!("Failed to open registry {}", path.display()))?;
    debug!(len = registry.len(), "Registry loaded");

    match registry.get_details(id).await {
        Ok(details) => {
            println!("{}", "🔍 Equipment:".green().bold());
            print_details(id, &details.name, &details.registrant, &details.document_ref);
            Ok(())
        }
        Err(EquipmentError::NotFound(_)) => anyhow::bail!("equipment {} does not exist", id),
        Err(e) => Err(e).context("Lookup failed"),
    }
}

/// Print registration history
async fn cmd_events(path: &Path, json: bool) -> Result<()> {
    let events = read_journal(path)
        .await
        .with_context(|| format!("Failed to read registry {}", path.display()))?;

    if json {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "⚠️  No registrations yet.".yellow());
        return Ok(());
    }

    println!("{} {} registration(s):", "📜".cyan(), events.len());
    for event in &events {
        println!(
            "   {} {} {} {} {}",
            format!("#{}", event.sequence).dimmed(),
            event.registered_at.format("%Y-%m-%d %H:%M:%S"),
            format!("id={}", event.id).yellow(),
            event.name,
            format!("by {}", event.registrant).dimmed(),
        );
    }

    Ok(())
}

/// Run API server
async fn cmd_serve(port: u16, bind: &str, registry: Option<PathBuf>) -> Result<()> {
    let addr = bind_addr(bind, port)?;

    println!("{}", "🚀 Starting EQUIPREG API server...".cyan().bold());
    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    match &registry {
        Some(path) => println!("   {} {}", "Journal:".dimmed(), path.display()),
        None => println!("   {} in-memory (use --registry to persist)", "Storage:".dimmed()),
    }
    println!("\n   Press Ctrl+C to stop.\n");

    let mut config = ApiConfig::from_env().context("Invalid server configuration")?;
    config.registry_path = registry;

    let server = ApiServer::new(config)
        .await
        .context("Failed to open registry")?;

    server.run(addr).await?;

    Ok(())
}

fn bind_addr(bind: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = bind
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;
    Ok(SocketAddr::new(ip, port))
}

fn print_details(id: EquipmentId, name: &str, registrant: &Principal, document_ref: &str) {
    println!("   {} {}", "Id:".dimmed(), id);
    println!("   {} {}", "Name:".dimmed(), display_or_empty(name));
    println!("   {} {}", "Registrant:".dimmed(), registrant);
    println!("   {} {}", "Document:".dimmed(), display_or_empty(document_ref));
}

fn display_or_empty(value: &str) -> ColoredString {
    if value.is_empty() {
        "(empty)".dimmed()
    } else {
        value.normal()
    }
}
