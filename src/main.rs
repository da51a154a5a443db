use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use review_harvest::{
    clamp_target_count, generate_summary, progress_fraction, read_app_list_file, AppFailure,
    AppReference, BatchCollector, CollectProgress, Config, ExportOptions, Exporter,
    Locale, PlayStoreClient,
};

#[derive(Parser)]
#[command(name = "review-harvest")]
#[command(about = "Collect app-store reviews and export them as CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the YAML config file
    #[arg(long, global = true, default_value = ".review-harvest/config.yml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every app listed in a CSV with app_name and package_name columns
    Batch {
        /// Path to the apps CSV
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Scrape apps from the configured catalog
    Catalog {
        /// Catalog display name (repeatable). Defaults to every entry.
        #[arg(long = "app")]
        apps: Vec<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Search the store and scrape the top match
    Search {
        /// Free-text app search
        #[arg(long)]
        query: String,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Reviews per app, clamped to 100..=100000
    #[arg(long)]
    count: Option<u32>,

    /// Directory to write the CSV into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of rows to preview in the summary
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

/// Prints run status to stderr
#[derive(Default)]
struct ConsoleProgress {
    total: usize,
}

impl CollectProgress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }

    fn app_started(&mut self, label: &str) {
        eprintln!("Scraping {}...", label);
    }

    fn app_done(&mut self, completed: usize, total: usize) {
        eprintln!(
            "[{}/{}] {:.0}%",
            completed,
            total,
            progress_fraction(completed, total) * 100.0
        );
    }

    fn warning(&mut self, failure: &AppFailure) {
        eprintln!("Could not scrape {}: {}", failure.label, failure.error);
    }

    fn finish(&mut self) {
        eprintln!("Scraping complete ({} apps).", self.total);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("review_harvest=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let (references, run) = match cli.command {
        Commands::Batch { input, run } => {
            let references = read_app_list_file(&input)
                .with_context(|| format!("Failed to read app list: {}", input.display()))?;
            (references, run)
        }
        Commands::Catalog { apps, run } => (catalog_references(&config, &apps)?, run),
        Commands::Search { query, run } => (vec![AppReference::search(query)], run),
    };

    run_collection(&config, references, run).await
}

/// Look up catalog entries by name; no names selects the whole catalog
fn catalog_references(config: &Config, names: &[String]) -> Result<Vec<AppReference>> {
    if config.catalog.is_empty() {
        anyhow::bail!("The catalog is empty. Add entries under `catalog:` in the config file.");
    }

    if names.is_empty() {
        return Ok(config.catalog.iter().map(AppReference::from).collect());
    }

    names
        .iter()
        .map(|name| match config.catalog_entry(name) {
            Some(entry) => Ok(AppReference::from(entry)),
            None => {
                let known: Vec<_> = config
                    .catalog
                    .iter()
                    .map(|e| e.display_name.as_str())
                    .collect();
                anyhow::bail!("Unknown catalog app '{}'. Known apps: {}", name, known.join(", "))
            }
        })
        .collect()
}

async fn run_collection(config: &Config, references: Vec<AppReference>, run: RunArgs) -> Result<()> {
    let requested = run.count.unwrap_or(config.collection.target_count);
    let target_count = clamp_target_count(requested);
    if target_count != requested {
        warn!(requested, target_count, "Review count clamped to supported range");
    }

    let client = PlayStoreClient::from_config(&config.store).context("Failed to create store client")?;
    let collector = BatchCollector::new(client.clone(), client, Locale::default());

    let mut progress = ConsoleProgress::default();
    let collection = collector
        .collect(&references, target_count, &mut progress)
        .await?;

    let exporter = Exporter::new(ExportOptions::from(&config.export));
    let columns = exporter.columns(&collection.batch);

    println!("{}", generate_summary(&collection, &columns, run.preview));

    if collection.batch.is_empty() {
        return Ok(());
    }

    let output_dir = run
        .output_dir
        .unwrap_or_else(|| config.export.output_dir.clone());
    let path = exporter
        .write_to_dir(&collection.batch, &output_dir, collection.export_label())
        .with_context(|| format!("Failed to write export to {}", output_dir.display()))?;

    info!(path = %path.display(), reviews = collection.batch.len(), "Export complete");
    println!("Wrote {}", path.display());

    Ok(())
}
