//! panelkit CLI binary.
//!
//! Pulls the research datasets from the warehouse and writes the snapshots.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use panelkit::features::registry::{FeatureCategory, available_features, features_by_category};
use panelkit::{Exchange, Pipeline, Settings, Source};
use panelkit_data::{DateRange, SqliteWarehouse};
use panelkit_features::DelistingPolicy;
use panelkit_output::ExportFormat;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "panelkit")]
#[command(about = "panelkit: point-in-time CRSP, Compustat and IBES research panels", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// First date of the pull window (YYYY-MM-DD)
    #[arg(long, global = true)]
    start: Option<String>,

    /// Last date of the pull window (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<String>,

    /// Snapshot directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Run report directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory holding one SQLite database per WRDS library
    #[arg(long, global = true)]
    warehouse_dir: Option<PathBuf>,

    /// Snapshot format (parquet, csv or json)
    #[arg(long, global = true)]
    format: Option<ExportFormat>,

    /// Delisting adjustment (imputed-compound or additive)
    #[arg(long, global = true)]
    delisting_policy: Option<DelistingPolicy>,

    /// Listing exchanges, comma separated (e.g. NYSE,NASDAQ)
    #[arg(long, global = true, value_delimiter = ',')]
    exchanges: Option<Vec<Exchange>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull one source and write its snapshots
    Pull {
        /// crsp, crsp-index, compustat, compustat-quarterly, ccm, ff, french, fred or ibes
        source: Source,
    },

    /// Compute financial ratios from the annual fundamentals snapshot
    Derive,

    /// Link CRSP to Compustat and IBES
    Link,

    /// Check forecast key uniqueness
    Validate,

    /// Pull every source, then derive, link and validate
    All,

    /// List the derived feature sets
    Features {
        /// Filter by category (returns, fundamentals, ratios)
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    if let Commands::Features { category } = &cli.command {
        return list_features(category.as_deref());
    }

    let settings = apply_overrides(Settings::from_env()?, &cli)?;
    info!(
        start = %settings.range.start,
        end = %settings.range.end,
        data_dir = %settings.data_dir.display(),
        wrds_username = settings.wrds_username.as_deref().unwrap_or("<unset>"),
        "panelkit {}",
        panelkit::VERSION
    );

    let warehouse = match cli.command {
        Commands::Pull { .. } | Commands::All => {
            SqliteWarehouse::open(&settings.warehouse_dir).map_err(|e| {
                format!(
                    "Failed to open warehouse at {}: {}",
                    settings.warehouse_dir.display(),
                    e
                )
            })?
        }
        _ => SqliteWarehouse::in_memory()?,
    };
    let mut pipeline = Pipeline::new(warehouse, settings);

    match cli.command {
        Commands::Pull { source } => {
            let pb = spinner(format!("Pulling {}...", source))?;
            match pipeline.pull(source).await {
                Ok(paths) => pb.finish_with_message(format!(
                    "Pulled {} ({} snapshot{})",
                    source,
                    paths.len(),
                    if paths.len() == 1 { "" } else { "s" }
                )),
                Err(e) => {
                    pb.finish_with_message("Failed!");
                    return Err(e.into());
                }
            }
        }
        Commands::Derive => {
            let pb = spinner("Computing financial ratios...")?;
            let path = pipeline.derive()?;
            pb.finish_with_message(format!("Wrote {}", path.display()));
        }
        Commands::Link => {
            let pb = spinner("Linking CRSP to Compustat and IBES...")?;
            let paths = pipeline.link()?;
            pb.finish_with_message(format!("Wrote {} linked panels", paths.len()));
        }
        Commands::Validate => {
            let report = pipeline.validate()?;
            println!("Forecast rows:        {}", report.rows);
            println!("Distinct keys:        {}", report.groups);
            println!("Largest key group:    {}", report.max_group_size);
            println!("Duplicated keys:      {}", report.duplicated_groups);
            println!(
                "(ticker, statpers):   {}",
                if report.is_unique() { "unique" } else { "NOT unique" }
            );
        }
        Commands::All => {
            let pb = spinner("Running full pipeline...")?;
            match pipeline.run_all().await {
                Ok(()) => pb.finish_with_message(format!(
                    "Wrote {} snapshots ({} rows)",
                    pipeline.report().steps.len(),
                    pipeline.report().total_rows()
                )),
                Err(e) => {
                    pb.finish_with_message("Failed!");
                    return Err(e.into());
                }
            }
        }
        Commands::Features { .. } => {}
    }

    for warning in &pipeline.report().warnings {
        eprintln!("Warning: {}", warning);
    }
    let report_path = pipeline.finish()?;
    println!("Run report: {}", report_path.display());

    Ok(())
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> CliResult<Settings> {
    if cli.start.is_some() || cli.end.is_some() {
        let start = cli
            .start
            .clone()
            .unwrap_or_else(|| settings.range.start.to_string());
        let end = cli
            .end
            .clone()
            .unwrap_or_else(|| settings.range.end.to_string());
        settings.range = DateRange::parse(&start, &end)?;
    }
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(dir) = &cli.warehouse_dir {
        settings.warehouse_dir = dir.clone();
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    if let Some(policy) = cli.delisting_policy {
        settings.delisting_policy = Some(policy);
    }
    if let Some(exchanges) = &cli.exchanges {
        settings.exchanges = exchanges.clone();
    }
    Ok(settings)
}

fn spinner(message: impl Into<String>) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    Ok(pb)
}

fn list_features(category: Option<&str>) -> CliResult<()> {
    let features = match category {
        Some(name) => {
            let category = match name.to_ascii_lowercase().as_str() {
                "returns" => FeatureCategory::Returns,
                "fundamentals" => FeatureCategory::Fundamentals,
                "ratios" => FeatureCategory::Ratios,
                other => return Err(format!("Unknown category: {}", other).into()),
            };
            features_by_category(category)
        }
        None => available_features(),
    };

    println!("{:<26} {:<14} DESCRIPTION", "FEATURE", "CATEGORY");
    println!("{}", "─".repeat(80));
    for feature in features {
        println!(
            "{:<26} {:<14} {}",
            feature.name,
            feature.category.to_string(),
            feature.description
        );
        println!("{:<41} adds: {}", "", feature.output_columns.join(", "));
    }
    Ok(())
}
