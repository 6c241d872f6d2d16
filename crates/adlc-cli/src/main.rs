use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

mod commands;

#[derive(Parser)]
#[command(name = "adlc")]
#[command(about = "Ad lifecycle controller operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> environment -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Fail instead of warn when the config carries keys nothing reads.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Persisted cooldown records
    Cooldown {
        #[command(subcommand)]
        cmd: CooldownCmd,
    },

    /// Drive a controller against the scripted provider and print its events.
    #[cfg(feature = "testkit")]
    Simulate {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CooldownCmd {
    /// Print last show time and remaining cooldown per kind.
    Status {
        /// Cooldown store file
        #[arg(long)]
        store: PathBuf,

        /// Cooldown window in seconds
        #[arg(long, default_value_t = 60)]
        window_secs: u64,
    },

    /// Clear persisted records (all kinds unless --kind is given).
    Reset {
        /// Cooldown store file
        #[arg(long)]
        store: PathBuf,

        /// interstitial | rewarded
        #[arg(long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths, strict } => {
            let loaded = commands::load_config(&paths)?;
            let unused = commands::unused_keys(&loaded.config_json, strict)?;
            for pointer in &unused {
                warn!(pointer = %pointer, "config key is not read by anything");
            }
            // Validate the typed view too; a hash of an unusable config is misleading.
            adlc_config::AdsConfig::from_config_json(&loaded.config_json)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Cooldown { cmd } => match cmd {
            CooldownCmd::Status { store, window_secs } => {
                let rows =
                    commands::cooldown::status(&store, Duration::from_secs(window_secs), Utc::now())?;
                for row in rows {
                    println!("{row}");
                }
            }
            CooldownCmd::Reset { store, kind } => {
                let kind = commands::parse_cooldown_kind(kind.as_deref())?;
                commands::cooldown::reset(&store, kind)?;
                match kind {
                    Some(k) => println!("cooldown_reset kind={k}"),
                    None => println!("cooldown_reset kind=all"),
                }
            }
        },

        #[cfg(feature = "testkit")]
        Commands::Simulate { config_paths } => {
            commands::simulate::run(&config_paths).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
