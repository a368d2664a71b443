//! `pls`: plugin license provisioning from the command line.
//!
//! Usage:
//!   pls provision acme-plugin --provider acme
//!   pls activate acme-plugin
//!   pls status acme-plugin
//!   pls check acme-plugin
//!   pls serve --port 8080
//!
//! The storage secret comes from `--secret-key`/`--secret-salt` or the
//! `PLS_SECRET_KEY`/`PLS_SECRET_SALT` environment variables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pls_cli::{API_PREFIX, Operation, build_router, execute};
use pls_crypto::{CodecConfig, KdfParams, SecretCodec};
use pls_license::{LicenseManager, LicensingConfig, ProcessMapLock};
use pls_store::SqliteStore;
use std::{path::PathBuf, sync::Arc};
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pls")]
#[command(about = "Provision, activate and validate plugin licenses")]
struct Args {
    /// Licensing configuration file (JSON)
    #[arg(short, long, env = "PLS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding license records
    #[arg(long, env = "PLS_DB", default_value = "pls.sqlite3")]
    db: PathBuf,

    /// Secret the storage encryption key is derived from
    #[arg(long, env = "PLS_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Salt for key derivation (at least 8 bytes)
    #[arg(long, env = "PLS_SECRET_SALT", hide_env_values = true)]
    secret_salt: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    License(Operation),

    /// Serve the license operations over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => LicensingConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => LicensingConfig::default(),
    };
    debug!(?config, "configuration loaded");

    let codec = SecretCodec::from_config(&CodecConfig {
        secret_key: args.secret_key,
        secret_salt: args.secret_salt,
        kdf: KdfParams::default(),
    })
    .context("failed to derive storage key")?;
    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("failed to open {}", args.db.display()))?;
    let manager = LicenseManager::from_config(&config, Arc::new(store), Arc::new(codec))?;

    match args.command {
        Command::License(operation) => {
            let line = execute(&manager, &operation).await?;
            println!("{line}");
        }
        Command::Serve { port, host } => {
            let manager = manager.with_lock(Arc::new(ProcessMapLock::new()));
            let app = build_router(Arc::new(manager));

            let listener = tokio::net::TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("failed to bind {host}:{port}"))?;
            info!("License API listening on http://{host}:{port}{API_PREFIX}");
            axum::serve(listener, app).await.context("HTTP server failed")?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    if verbose {
        builder.with_max_level(Level::DEBUG).init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        builder.with_env_filter(filter).init();
    }
}
