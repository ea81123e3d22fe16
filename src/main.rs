//! CLI entry point for kickstats.
//!
//! Loads the project dataset once and prints the data behind one dashboard
//! page, either as a pretty log, as JSON on stdout, or as a CSV table.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kickstats::config::FilterConfig;
use kickstats::dataset::Dataset;
use kickstats::output::{print_json, print_pretty, write_table};
use kickstats::pages::pledge_distribution::BarMetric;
use kickstats::pages::{
    Panel, Report, goal_comparison, pledge_distribution, state_overview, takeaways,
};
use kickstats::pipeline::RangeFilter;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "kickstats")]
#[command(about = "Explore the most funded US Kickstarter projects", long_about = None)]
struct Cli {
    /// Project CSV (optionally .gz)
    #[arg(
        short,
        long,
        env = "KICKSTATS_DATASET",
        default_value = "most_funded_feb_2023.csv",
        global = true
    )]
    dataset: PathBuf,

    /// JSON file with default filter values
    #[arg(long, env = "KICKSTATS_FILTERS", global = true)]
    filters: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Args)]
struct CategoryArgs {
    /// Keep only this category (repeatable)
    #[arg(short, long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// Select no category at all
    #[arg(long, conflicts_with = "categories")]
    no_categories: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline metrics and per-state maps
    States {
        #[command(flatten)]
        categories: CategoryArgs,

        /// Range on a state's total pledged, e.g. 0..50000000
        #[arg(long, value_name = "LO..HI")]
        pledged: Option<RangeFilter>,

        /// Range on a state's number of projects
        #[arg(long, value_name = "LO..HI")]
        projects: Option<RangeFilter>,
    },
    /// Pledged amount distribution and category bars
    Distribution {
        #[command(flatten)]
        categories: CategoryArgs,

        /// Range on a project's pledged amount
        #[arg(long, value_name = "LO..HI")]
        pledged: Option<RangeFilter>,

        /// Bar chart metric: total-pledged, average-pledged or total-projects
        #[arg(short, long)]
        metric: Option<BarMetric>,

        /// Number of histogram bins
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Average pledged versus average goal by category
    Goals {
        /// Category shown on the gauge
        #[arg(short, long)]
        category: Option<String>,

        /// Categories need more projects than this
        #[arg(long)]
        min_projects: Option<usize>,
    },
    /// Narrative summary of the analysis
    Takeaways,
    /// List the category labels of the dataset
    Categories,
    /// Write a page's main table as CSV
    Export {
        #[arg(short, long, value_enum)]
        page: ExportPage,

        /// CSV file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportPage {
    States,
    Distribution,
    Goals,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/kickstats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("kickstats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.filters {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };

    match cli.command {
        Commands::States {
            categories,
            pledged,
            projects,
        } => {
            let mut filter = config.state_overview();
            filter.categories = config.categories(&categories.categories, categories.no_categories);
            filter.pledged_total = pledged.or(filter.pledged_total);
            filter.project_count = projects.or(filter.project_count);

            let (dataset, source) = load(&cli.dataset)?;
            let view = state_overview::build(&dataset, &filter);
            emit(cli.format, &Report::new("states", source, dataset.len(), view))?;
        }
        Commands::Distribution {
            categories,
            pledged,
            metric,
            bins,
        } => {
            let mut filter = config.pledge_distribution();
            filter.categories = config.categories(&categories.categories, categories.no_categories);
            filter.pledged = pledged.or(filter.pledged);
            filter.metric = metric.unwrap_or(filter.metric);
            filter.bins = bins.unwrap_or(filter.bins);

            let (dataset, source) = load(&cli.dataset)?;
            let view = pledge_distribution::build(&dataset, &filter);
            emit(
                cli.format,
                &Report::new("distribution", source, dataset.len(), view),
            )?;
        }
        Commands::Goals {
            category,
            min_projects,
        } => {
            let mut filter = config.goal_comparison();
            filter.category = category.or(filter.category);
            filter.min_projects = min_projects.unwrap_or(filter.min_projects);

            let (dataset, source) = load(&cli.dataset)?;
            let view = goal_comparison::build(&dataset, &filter);
            emit(cli.format, &Report::new("goals", source, dataset.len(), view))?;
        }
        Commands::Takeaways => {
            emit(cli.format, &takeaways::build())?;
        }
        Commands::Categories => {
            let (dataset, _) = load(&cli.dataset)?;
            emit(cli.format, &dataset.categories())?;
        }
        Commands::Export { page, output, gzip } => {
            let (dataset, _) = load(&cli.dataset)?;
            export(&dataset, &config, page, &output, gzip)?;
        }
    }

    Ok(())
}

/// Loads the dataset snapshot and returns it with its display name.
fn load(path: &Path) -> Result<(Dataset, String)> {
    let dataset =
        Dataset::open(path).with_context(|| format!("loading dataset {}", path.display()))?;
    let source = path.display().to_string();

    if dataset.is_empty() {
        warn!(dataset = %source, "No US projects in dataset");
    }
    Ok((dataset, source))
}

fn emit<T: Serialize + std::fmt::Debug>(format: Format, view: &T) -> Result<()> {
    match format {
        Format::Pretty => {
            print_pretty(view);
            Ok(())
        }
        Format::Json => print_json(view),
    }
}

/// Writes the main table of `page`, built from the file filters, as CSV.
#[tracing::instrument(skip_all, fields(output = %output.display(), gzip = gzip))]
fn export(
    dataset: &Dataset,
    config: &FilterConfig,
    page: ExportPage,
    output: &Path,
    gzip: bool,
) -> Result<()> {
    match page {
        ExportPage::States => {
            let view = state_overview::build(dataset, &config.state_overview());
            write_panel(output, &view.pledged_map, gzip)
        }
        ExportPage::Distribution => {
            let view = pledge_distribution::build(dataset, &config.pledge_distribution());
            write_panel(output, &view.bars, gzip)
        }
        ExportPage::Goals => {
            let view = goal_comparison::build(dataset, &config.goal_comparison());
            write_panel(output, &view.table, gzip)
        }
    }
}

fn write_panel<T: Serialize>(output: &Path, panel: &Panel<Vec<T>>, gzip: bool) -> Result<()> {
    match panel {
        Panel::Ready(rows) => write_table(output, rows, gzip),
        Panel::NoData { reason } => {
            info!(%reason, "Nothing to export");
            write_table::<T>(output, &[], gzip)
        }
    }
}
