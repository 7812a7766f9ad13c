//! Dashboard Engine - server and operator CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashboard_engine::engine::{compute_result_id, ConnectionCredentials};
use dashboard_engine::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dashboard-engine")]
#[command(about = "Query execution and parameter resolution engine for dashboards")]
struct Cli {
    /// Path to the YAML config file (defaults to ./config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Encrypt connection credentials into a stored config blob
    EncryptCredentials {
        #[arg(long)]
        uri: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "CONNECTION_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        database: Option<String>,
    },

    /// Print the result id for a connection, query and params
    Fingerprint {
        #[arg(long)]
        connection_id: String,
        #[arg(long)]
        query: String,
        /// Params as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dashboard_engine=debug,tower_http=debug".into()),
        )
        .with(cli.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            dashboard_engine::start_server(config).await
        }
        Commands::EncryptCredentials {
            uri,
            username,
            password,
            database,
        } => {
            let vault = config.vault()?;
            let blob = vault.encrypt(&ConnectionCredentials {
                uri,
                username,
                password,
                database,
            })?;
            println!("{}", blob);
            Ok(())
        }
        Commands::Fingerprint {
            connection_id,
            query,
            params,
        } => {
            let params = params
                .map(|raw| serde_json::from_str::<serde_json::Value>(&raw))
                .transpose()
                .context("--params must be valid JSON")?;
            println!(
                "{}",
                compute_result_id(&connection_id, &query, params.as_ref())
            );
            Ok(())
        }
    }
}
