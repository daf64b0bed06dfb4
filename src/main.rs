//! CLI entry point for the idealista18 enrichment tool.
//!
//! Provides subcommands for enriching a city's listings with census and
//! marketing-zone statistics, loading points of interest, and fetching
//! models and dataset splits from the artifact registry.

use anyhow::Result;
use clap::{Parser, Subcommand};
use idealista18_enrich::{
    artifacts::{get_dataset, get_model},
    config::{City, RegistryConfig, SourceConfig},
    enrich::{EnrichOptions, Enricher},
    fetch::{Resource, source_from_config},
    frame::column_names,
    geometry::points_from_columns,
    infra::registry::registry_from_config,
    loader::{DATASET_DELIMITER, Loader},
    output::{print_json, print_pretty, write_frame},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "idealista18_enrich")]
#[command(about = "Enrich idealista18 listings with zone statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a city's listings with zone codes and per-zone price statistics
    Enrich {
        /// City to process (Madrid, Barcelona, Valencia)
        #[arg(short, long, default_value = "Madrid")]
        city: String,

        /// Read resources from a local copy of the dataset instead of the mirror
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// File to write the enriched listings to (gzip if it ends in .gz)
        #[arg(short, long, default_value = "enriched.csv.gz")]
        output: PathBuf,

        /// Keep one row per ASSETID and drop PERIOD
        #[arg(long, default_value_t = false)]
        deduplicate: bool,

        /// Skip the CUSEC_* statistic columns
        #[arg(long, default_value_t = false)]
        no_census_stats: bool,

        /// Skip the ID_* statistic columns
        #[arg(long, default_value_t = false)]
        no_zone_stats: bool,

        /// Standard deviations from the median beyond which a listing is a geographic outlier
        #[arg(long, default_value_t = 5.0)]
        zscore: f64,
    },
    /// Load a city's points of interest
    Pois {
        #[arg(short, long, default_value = "Madrid")]
        city: String,

        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Optional: write the points of interest to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch the first model artifact carrying a tag
    FetchModel {
        #[arg(long)]
        project: String,

        /// Tag stored in the artifact metadata
        #[arg(long)]
        tag: String,

        /// Directory to download artifacts into
        #[arg(long, default_value = "artifacts")]
        dest: PathBuf,

        /// Use a local registry directory instead of ARTIFACT_BUCKET
        #[arg(long)]
        registry_dir: Option<PathBuf>,
    },
    /// Fetch train/test splits from a dataset artifact
    FetchDataset {
        #[arg(long)]
        project: String,

        /// Artifact name, optionally with an alias (e.g. "splits:latest")
        #[arg(long)]
        artifact: String,

        #[arg(long, default_value = "artifacts")]
        dest: PathBuf,

        #[arg(long)]
        registry_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/idealista18_enrich.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("idealista18_enrich.log"));

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

    match cli.command {
        Commands::Enrich {
            city,
            data_dir,
            output,
            deduplicate,
            no_census_stats,
            no_zone_stats,
            zscore,
        } => {
            let city = City::new(&city)?;
            let source_config = SourceConfig::from_env(data_dir);
            let options = EnrichOptions {
                deduplicate_by_asset_id: deduplicate,
                enrich_census_code: !no_census_stats,
                enrich_marketing_zones: !no_zone_stats,
                outlier_zscore: zscore,
            };
            info!(city = %city, source = ?source_config, options = ?options, "Starting enrichment");

            let enrichment = tokio::task::spawn_blocking(move || {
                let enricher = Enricher::new(source_from_config(&source_config), options);
                enricher.enrich(&city)
            })
            .await??;

            write_frame(&output, &enrichment.frame, DATASET_DELIMITER)?;
            print_json(&enrichment.summary)?;
            info!(
                output = %output.display(),
                rows = enrichment.frame.height(),
                columns = enrichment.frame.width(),
                "Enriched listings written"
            );
        }
        Commands::Pois {
            city,
            data_dir,
            output,
        } => {
            let city = City::new(&city)?;
            let source_config = SourceConfig::from_env(data_dir);

            let frame = tokio::task::spawn_blocking(move || {
                Loader::new(source_from_config(&source_config))
                    .frame(Resource::PointsOfInterest, &city)
            })
            .await??;

            let layer = points_from_columns(&frame, "LNG", "LAT")?;
            let located = layer.points.iter().flatten().count();
            if located < layer.len() {
                warn!(
                    missing = layer.len() - located,
                    "Points of interest without coordinates"
                );
            }
            info!(
                total = layer.len(),
                located,
                crs = layer.crs.code(),
                "Points of interest loaded"
            );

            if let Some(output) = output {
                write_frame(&output, &frame, DATASET_DELIMITER)?;
                info!(output = %output.display(), "Points of interest written");
            }
        }
        Commands::FetchModel {
            project,
            tag,
            dest,
            registry_dir,
        } => {
            let registry = registry_from_config(&RegistryConfig::from_env(registry_dir)?).await;

            let model =
                get_model::<serde_json::Value, _>(registry.as_ref(), &project, &tag, &dest).await?;
            match model {
                Some(model) => print_json(&model)?,
                None => warn!(project = %project, tag = %tag, "No model matches the tag"),
            }
        }
        Commands::FetchDataset {
            project,
            artifact,
            dest,
            registry_dir,
        } => {
            let registry = registry_from_config(&RegistryConfig::from_env(registry_dir)?).await;
            let splits = get_dataset(registry.as_ref(), &project, &artifact, &dest).await?;

            print_pretty(&column_names(&splits.x_train));
            info!(
                x_train = ?splits.x_train.shape(),
                x_test = ?splits.x_test.shape(),
                y_train = splits.y_train_values()?.len(),
                y_test = splits.y_test_values()?.len(),
                "Dataset splits loaded"
            );
        }
    }

    Ok(())
}
