use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use plinth_api::app;
use plinth_auth::PolicyGuard;
use plinth_core::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "plinth-api", version, about = "Plinth microservice host")]
struct Cli {
    /// Load environment variables from this file before reading configuration.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the API until interrupted (default).
    Serve,
    /// Print the merged Swagger document as JSON and exit.
    PrintSwagger,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    load_env_file(cli.env_file.as_deref())?;

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            plinth_observability::init(LogFormat::default());
            tracing::error!(error = %err, "invalid configuration");
            return Err(err).context("failed to resolve configuration");
        }
    };
    plinth_observability::init(config.log_format);
    config.log_config();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::PrintSwagger => print_swagger(&config),
    }
}

fn load_env_file(path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = session_store(&config).await?;
    let mut host = app::build_host(config, PolicyGuard::new(), store, app::routes::routes())
        .context("failed to assemble host")?;

    host.listen().await.context("failed to start server")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for shutdown signal")?;
    tracing::info!("shutdown requested");

    host.close().await.context("server did not shut down cleanly")?;
    Ok(())
}

fn print_swagger(config: &AppConfig) -> anyhow::Result<()> {
    let document = app::swagger_document(config).context("failed to assemble swagger document")?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

#[cfg(feature = "mongodb")]
async fn session_store(
    config: &AppConfig,
) -> anyhow::Result<tower_sessions_mongodb_store::MongoDBStore> {
    use tower_sessions_mongodb_store::{mongodb::Client, MongoDBStore};

    let client = Client::with_uri_str(config.session.store_url())
        .await
        .context("failed to connect session store")?;
    tracing::info!(host = %config.session.store_host, "using MongoDB session store");
    Ok(MongoDBStore::new(client, config.session.database.clone()))
}

#[cfg(not(feature = "mongodb"))]
async fn session_store(config: &AppConfig) -> anyhow::Result<tower_sessions::MemoryStore> {
    tracing::warn!(
        host = %config.session.store_host,
        "built without the `mongodb` feature; sessions are kept in memory and lost on restart"
    );
    Ok(tower_sessions::MemoryStore::default())
}
