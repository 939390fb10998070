use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tunnel_db::{
    Database, DatabaseConfig, Snapshot, TokenData, Tunnel, constants::DEFAULT_DB_FILE, snapshot,
};

/// CLI arguments for the database inspector
#[derive(Parser, Debug)]
#[command(name = "tdb")]
#[command(about = "Inspect the tunnel database snapshot", long_about = None)]
#[command(version)]
struct Args {
    /// Snapshot file to open
    #[arg(long, env = "TUNNEL_DB_PATH", default_value = DEFAULT_DB_FILE, global = true)]
    db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON (includes private keys)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Open the snapshot, rewrite it in normalized form and print record counts
    ///
    /// The other subcommands only read the file.
    Check,

    /// List every tunnel route
    Tunnels,

    /// Show the route for one domain
    Tunnel { domain: String },

    /// Show the identity behind a token
    Token { token: String },
}

/// Resolved settings for one invocation
#[derive(Debug, Clone)]
struct Config {
    db: DatabaseConfig,
    json: bool,
    command: Command,
}

impl Config {
    fn from_args(args: Args) -> Self {
        Self {
            db: DatabaseConfig::new(args.db),
            json: args.json,
            command: args.command,
        }
    }
}

#[derive(Serialize)]
struct Counts {
    tokens: usize,
    tunnels: usize,
}

/// Read the snapshot without touching the file
fn load_snapshot(config: &DatabaseConfig) -> Result<Snapshot> {
    let path = &config.path;
    snapshot::load(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?
        .ok_or_else(|| anyhow!("No snapshot at {}", path.display()))
}

fn run(config: &Config) -> Result<String> {
    debug!("Running {:?} against {}", config.command, config.db.path.display());

    match &config.command {
        Command::Check => {
            // Opening the store rewrites the file in normalized form
            let db = Database::open(config.db.clone());
            let counts = Counts {
                tokens: db.token_count(),
                tunnels: db.tunnel_count(),
            };
            if config.json {
                Ok(serde_json::to_string_pretty(&counts)?)
            } else {
                Ok(format!(
                    "{}: {} tokens, {} tunnels",
                    db.path().display(),
                    counts.tokens,
                    counts.tunnels
                ))
            }
        }
        Command::Tunnels => render_tunnels(&load_snapshot(&config.db)?.tunnels, config.json),
        Command::Tunnel { domain } => {
            let state = load_snapshot(&config.db)?;
            let tunnel = state
                .tunnels
                .get(domain)
                .ok_or_else(|| anyhow!("No tunnel configured for domain: {}", domain))?;
            if config.json {
                Ok(serde_json::to_string_pretty(tunnel)?)
            } else {
                Ok(describe_tunnel(domain, tunnel))
            }
        }
        Command::Token { token } => {
            let state = load_snapshot(&config.db)?;
            let data = state
                .tokens
                .get(token)
                .ok_or_else(|| anyhow!("Unknown token"))?;
            render_token(data, config.json)
        }
    }
}

fn render_tunnels(tunnels: &HashMap<String, Tunnel>, json: bool) -> Result<String> {
    let sorted: BTreeMap<_, _> = tunnels.iter().collect();

    if json {
        return Ok(serde_json::to_string_pretty(&sorted)?);
    }

    if sorted.is_empty() {
        return Ok("No tunnels configured".to_string());
    }

    let mut out = String::new();
    for (domain, tunnel) in sorted {
        writeln!(out, "{}", describe_tunnel(domain, tunnel))?;
    }
    Ok(out.trim_end().to_string())
}

/// One-line summary of a route, without key material
fn describe_tunnel(domain: &str, tunnel: &Tunnel) -> String {
    format!(
        "{} -> {}:{} via {}@{}:{} (tunnel port {})",
        domain,
        tunnel.client_name,
        tunnel.client_port,
        tunnel.username,
        tunnel.server_address,
        tunnel.server_port,
        tunnel.tunnel_port
    )
}

fn render_token(data: &TokenData, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(data)?)
    } else {
        Ok(format!("id: {}", data.id))
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging on stderr so stdout stays parseable
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Tunnel DB inspector v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_args(args);
    let output = run(&config)?;
    println!("{}", output);

    Ok(())
}
