mod query;

use clap::{Args, Parser, Subcommand};
use himalaya_core::{FilterSpec, SearchScope, DEFAULT_MAX_ELEVATION, DEFAULT_MIN_ELEVATION};
use himalaya_store::LocationStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "himalaya-cli")]
#[command(about = "Query the Himalayan research location archive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List locations matching the given filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one location in full
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show facet values and counts over the whole collection
    Facets {
        #[arg(long)]
        json: bool,
    },
    /// Report where the data came from
    Source,
}

#[derive(Debug, Default, Args)]
struct FilterArgs {
    /// Free-text search (case-insensitive substring)
    #[arg(long)]
    search: Option<String>,
    /// Also search histories and flora/fauna tags
    #[arg(long)]
    extended: bool,
    /// Location types, comma-separated (e.g. "Peak,Lake")
    #[arg(long = "type", value_delimiter = ',')]
    types: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    region: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    language: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    significance: Vec<String>,
    /// Minimum elevation in meters
    #[arg(long, default_value_t = DEFAULT_MIN_ELEVATION)]
    min_elevation: u32,
    /// Maximum elevation in meters
    #[arg(long, default_value_t = DEFAULT_MAX_ELEVATION)]
    max_elevation: u32,
}

impl FilterArgs {
    fn into_spec(self) -> FilterSpec {
        let scope = if self.extended {
            SearchScope::Extended
        } else {
            SearchScope::Basic
        };
        FilterSpec::default()
            .with_search(self.search.unwrap_or_default())
            .with_scope(scope)
            .with_types(self.types)
            .with_regions(self.region)
            .with_languages(self.language)
            .with_significance(self.significance)
            .with_elevation(self.min_elevation, self.max_elevation)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = himalaya_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = LocationStore::from_config(&config)?;
    let loaded = store.load().await;
    tracing::debug!(
        origin = loaded.origin.label(),
        count = loaded.locations.len(),
        "loaded locations"
    );

    match cli.command {
        Commands::List { filter, json } => query::run_list(&loaded, &filter.into_spec(), json)?,
        Commands::Show { id, json } => query::run_show(&loaded, &id, json)?,
        Commands::Facets { json } => query::run_facets(&loaded, json)?,
        Commands::Source => query::run_source(&loaded),
    }

    Ok(())
}
