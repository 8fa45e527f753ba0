//! Operator CLI: dealer key generation, token issuance and verification

use clap::{Parser, Subcommand};
use schat_core::SchatConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "schat")]
#[command(about = "SChat - threshold-signed authentication tokens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a fresh signing key among the parties
    Keygen {
        /// Number of parties (defaults to the configured value)
        #[arg(short = 'n', long)]
        parties: Option<u16>,

        /// Quorum threshold (defaults to the configured value)
        #[arg(short = 't', long)]
        threshold: Option<u16>,

        /// Where to write the key material
        #[arg(short, long, default_value = "schat-keys.json")]
        output: PathBuf,
    },

    /// Sign a token through the full quorum flow
    Issue {
        /// Key material file (defaults to the configured path)
        #[arg(short, long)]
        keys: Option<PathBuf>,

        /// Token subject
        #[arg(short, long)]
        subject: String,

        /// Lifetime in seconds (defaults to the access-token TTL)
        #[arg(long)]
        ttl: Option<u64>,

        /// Extra claim as key=value; JSON values are kept typed
        #[arg(long = "claim", value_name = "KEY=VALUE")]
        claims: Vec<String>,
    },

    /// Validate a token and print its claims
    Verify {
        /// Key material file (defaults to the configured path)
        #[arg(short, long)]
        keys: Option<PathBuf>,

        /// Wire token
        #[arg(long)]
        token: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = SchatConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen {
            parties,
            threshold,
            output,
        } => commands::keygen::run(
            parties.unwrap_or(config.parties),
            threshold.unwrap_or(config.threshold),
            &output,
        ),
        Commands::Issue {
            keys,
            subject,
            ttl,
            claims,
        } => commands::issue::run(&config, keys.as_deref(), &subject, ttl, &claims).await,
        Commands::Verify { keys, token } => {
            commands::verify::run(&config, keys.as_deref(), &token).await
        }
    }
}
