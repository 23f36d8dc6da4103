use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use course_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use course_catalog_server::{run_server, FullCatalogStore, RequestsLoggingLevel};
use course_catalog_server::{SqliteCatalogStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file, its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the SQLite catalog database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to a directory of static assets served for unmatched paths.
    #[clap(long)]
    pub public_dir_path: Option<String>,

    /// Number of days an unused session is kept before pruning. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 30)]
    pub session_retention_days: u64,

    /// Interval in hours between pruning runs. Only used if session_retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            public_dir_path: self.public_dir_path.clone(),
            session_retention_days: self.session_retention_days,
            prune_interval_hours: self.prune_interval_hours,
        }
    }
}

fn spawn_session_pruning(user_manager: UserManager, retention_days: u64, interval_hours: u64) {
    info!(
        "Session pruning enabled: retaining {} days, pruning every {} hours",
        retention_days, interval_hours
    );

    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match user_manager.prune_unused_auth_tokens(retention_days) {
                Ok(count) => {
                    if count > 0 {
                        info!("Pruned {} unused sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to prune sessions: {}", e);
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let db_path = config.catalog_db_path();
    info!("Opening SQLite catalog database at {:?}...", db_path);
    let store: Arc<dyn FullCatalogStore> = Arc::new(SqliteCatalogStore::new(&db_path)?);

    if config.session_retention_days > 0 {
        spawn_session_pruning(
            UserManager::new(store.clone()),
            config.session_retention_days,
            config.prune_interval_hours,
        );
    }

    info!("Ready to serve at port {}!", config.port);
    run_server(store, config.server_config()).await
}
