//! # sap-cli
//!
//! `sapmeta`: browse, search and export the metadata of one SAP system.
//!
//! Remote calls are answered by recorded responses from the configured
//! fixtures directory; everything else (cache files, snapshots, schema
//! generation) runs exactly as it does inside the connector.

mod commands;
mod config;
mod fixtures;

use clap::{Parser, Subcommand, ValueEnum};
use config::ConnectorConfig;
use fixtures::FixtureExecutor;
use sap_cache::{FileCacheStorage, MetadataCache};
use sap_metadata::{OperationKind, RfcMetadataSource, RfcSourceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sapmeta")]
#[command(about = "SAP metadata cache and schema generator")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// System id (overrides the configuration file)
    #[arg(short, long)]
    system: Option<String>,

    /// Cache directory (overrides the configuration file)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Directory of recorded function responses
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Bapi,
    Rfc,
    Idoc,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Bapi => OperationKind::Bapi,
            KindArg::Rfc => OperationKind::Rfc,
            KindArg::Idoc => OperationKind::Idoc,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reload metadata from the remote system and persist it
    Reload {
        /// Reload only one kind (not persisted)
        #[arg(short, long)]
        kind: Option<KindArg>,
    },

    /// Search cached (or remote) operations with SAP wildcards
    Search {
        kind: KindArg,

        /// Object type, function name or message type
        #[arg(short, long)]
        primary: Option<String>,

        /// Method, function group or IDOC type
        #[arg(short = 'm', long)]
        secondary: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Search a fresh remote listing instead of the cache
        #[arg(long)]
        remote: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the interface of a function or IDOC type as JSON
    Interface {
        kind: KindArg,

        /// Function name or IDOC type
        name: String,

        /// IDOC extension
        #[arg(short, long)]
        extension: Option<String>,

        /// Refetch and replace the interface file
        #[arg(long)]
        refresh: bool,
    },

    /// Generate the input/output schema of a cached operation
    Generate {
        kind: KindArg,

        /// Object type, function name or message type
        container: String,

        /// Operation key inside the container (method, or IDOC type with
        /// optional `:extension`); defaults to the first one
        #[arg(short, long)]
        item: Option<String>,

        /// Target namespace of the schema
        #[arg(short, long)]
        namespace: Option<String>,

        /// Print the method descriptor as JSON instead of the XSD
        #[arg(long)]
        descriptor: bool,

        #[arg(long)]
        refresh: bool,
    },

    /// Print the business object component tree
    Components {
        /// Only branches that lead to cached business objects
        #[arg(long)]
        prune: bool,

        #[arg(long)]
        refresh: bool,
    },

    /// Preload all bulk cache files concurrently
    Warm {
        /// Concurrent requests per kind
        #[arg(short, long, default_value_t = 2)]
        parallel: usize,

        #[arg(long)]
        refresh: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<ConnectorConfig> {
    let config = match &cli.config {
        Some(path) => ConnectorConfig::load(path)?,
        None => ConnectorConfig::default(),
    };
    let config = config.with_overrides(
        cli.system.clone(),
        cli.cache_dir.clone(),
        cli.fixtures.clone(),
    );
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &ConnectorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_cache(config: &ConnectorConfig) -> anyhow::Result<MetadataCache> {
    let executor = FixtureExecutor::new(config.fixtures_dir()?);
    let source = RfcMetadataSource::with_config(
        executor,
        RfcSourceConfig {
            unicode: config.unicode,
        },
    );
    let cache = MetadataCache::builder()
        .id(config.system_id.clone())
        .storage(Arc::new(FileCacheStorage::new(config.layout())))
        .source(Arc::new(source))
        .loader(config.loader_config())
        .build()?;
    Ok(cache)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config);

    let cache = open_cache(&config)?;
    info!(system = %config.system_id, cache_dir = %config.layout().root().display(), "cache ready");

    match cli.command {
        Commands::Reload { kind } => commands::reload(&cache, kind.map(Into::into)),
        Commands::Search {
            kind,
            primary,
            secondary,
            description,
            remote,
            json,
        } => commands::search(
            &cache,
            kind.into(),
            &commands::SearchPatterns {
                primary,
                secondary,
                description,
            },
            remote,
            json,
        ),
        Commands::Interface {
            kind,
            name,
            extension,
            refresh,
        } => commands::interface(&cache, kind.into(), &name, extension.as_deref(), refresh),
        Commands::Generate {
            kind,
            container,
            item,
            namespace,
            descriptor,
            refresh,
        } => commands::generate(
            &cache,
            kind.into(),
            &container,
            item.as_deref(),
            namespace,
            descriptor,
            refresh,
        ),
        Commands::Components { prune, refresh } => commands::components(&cache, prune, refresh),
        Commands::Warm { parallel, refresh } => {
            commands::warm(Arc::new(cache), parallel, refresh).await
        }
    }
}
