//! reposync operator binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use reposync_core::config::AppConfig;
use reposync_core::{ContentKind, RepositoryValidationRequest};
use reposync_service::{OrphanScheduler, Services};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// reposync - YUM repository content index
#[derive(Parser, Debug)]
#[command(name = "reposyncd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "REPOSYNC_CONFIG",
        default_value = "config/reposync.toml",
        global = true
    )]
    config: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Packages,
    PackageGroups,
    Environments,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Packages => ContentKind::Package,
            KindArg::PackageGroups => ContentKind::PackageGroup,
            KindArg::Environments => ContentKind::Environment,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synchronize a crawled JSON listing into a repository
    Sync {
        #[arg(long)]
        repository: Uuid,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// JSON array of listing items
        #[arg(long)]
        listing: PathBuf,
    },
    /// Delete unreferenced content once
    CollectOrphans {
        /// Kinds to collect (default: all)
        #[arg(long, value_enum)]
        kind: Vec<KindArg>,
    },
    /// Run the periodic orphan collector until interrupted
    Run,
    /// Print an org's storage domain, assigning one on first use
    Domain { org_id: String },
    /// Validate repository parameters and print the result as JSON
    Validate {
        #[arg(long)]
        org: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// File holding one or more armored public keys
        #[arg(long)]
        gpg_key_file: Option<PathBuf>,
        /// Verify the repomd signature with the GPG key
        #[arg(long)]
        verify: bool,
        /// Configuration uuids ignored by the duplicate checks
        #[arg(long)]
        exclude: Vec<Uuid>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    match args.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("reposync v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let services = Services::from_config(config)
        .await
        .context("failed to initialize services")?;
    tracing::info!("Metadata store initialized");

    match args.command {
        Command::Sync {
            repository,
            kind,
            listing,
        } => {
            let bytes = tokio::fs::read(&listing)
                .await
                .with_context(|| format!("failed to read listing: {}", listing.display()))?;
            let outcome = services
                .sync_listing(repository, kind.into(), &bytes)
                .await
                .context("synchronization failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::CollectOrphans { kind } => {
            let kinds: Vec<ContentKind> = if kind.is_empty() {
                ContentKind::ALL.to_vec()
            } else {
                kind.into_iter().map(ContentKind::from).collect()
            };
            let results = services
                .collect_orphans(&kinds)
                .await
                .context("orphan collection failed")?;
            for (kind, deleted) in results {
                println!("{kind}: {deleted}");
            }
        }
        Command::Run => run(&services).await?,
        Command::Domain { org_id } => {
            let name = services
                .domains
                .fetch_or_create(&org_id)
                .await
                .context("domain allocation failed")?;
            println!("{name}");
        }
        Command::Validate {
            org,
            name,
            url,
            gpg_key_file,
            verify,
            exclude,
        } => {
            let gpg_key = match gpg_key_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read key file: {}", path.display()))?,
                ),
                None => None,
            };
            let request = RepositoryValidationRequest {
                name,
                url,
                gpg_key,
                metadata_verification: verify,
                uuid: None,
            };
            let response = services
                .validator
                .validate_parameters(&org, &request, &exclude)
                .await
                .context("validation failed")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Load configuration from the optional file, then `REPOSYNC_` environment
/// variables. Without either, defaults apply.
fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("REPOSYNC_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(services: &Services) -> Result<()> {
    let handle = match OrphanScheduler::from_config(services) {
        Some(scheduler) => Some(scheduler.spawn()),
        None => {
            tracing::info!("Automatic orphan collection disabled");
            None
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    if let Some(handle) = handle {
        handle.abort();
    }
    Ok(())
}
