//! Morsel CLI - Pink Morsel sales ingestion and reports
//!
//! # Main Commands
//!
//! ```bash
//! morsel process                    # data/*.csv -> formatted_sales_data.csv
//! morsel serve                      # JSON query API (port 8050)
//! ```
//!
//! # Reports (read the formatted artifact)
//!
//! ```bash
//! morsel summary --region north     # Total / mean / count
//! morsel daily --region all         # Sales per day as JSON
//! morsel compare                    # Before/after the price increase
//! morsel regions                    # Regions present
//! ```

use clap::{Parser, Subcommand};
use morsel::{
    compare_before_after, daily_totals, date_range, filter_by_region, load_sales_table, regions,
    run_pipeline, summary_stats, PipelineError, PipelineOptions, RegionFilter, SalesRecord,
    Settings,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "morsel")]
#[command(about = "Pink Morsel sales ingestion and before/after analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the regional CSV files and write the formatted artifact
    Process {
        /// Directory of source CSV files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output artifact
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summary statistics of the formatted artifact
    Summary {
        /// Formatted artifact (default: configured output)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Region value, or "all"
        #[arg(short, long, default_value = "all")]
        region: RegionFilter,
    },

    /// Sales per day as JSON
    Daily {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, default_value = "all")]
        region: RegionFilter,
    },

    /// Compare mean sale before and after the threshold date
    Compare {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, default_value = "all")]
        region: RegionFilter,

        /// Threshold date, YYYY-MM-DD (default: price increase date)
        #[arg(short, long)]
        threshold: Option<chrono::NaiveDate>,
    },

    /// List regions present in the formatted artifact
    Regions {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Start the JSON query API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory used by POST /api/process
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Process { data_dir, output } => cmd_process(&settings, data_dir, output),

        Commands::Summary { input, region } => cmd_summary(&settings, input, &region),

        Commands::Daily { input, region } => cmd_daily(&settings, input, &region),

        Commands::Compare {
            input,
            region,
            threshold,
        } => cmd_compare(&settings, input, &region, threshold),

        Commands::Regions { input } => cmd_regions(&settings, input),

        Commands::Serve {
            port,
            input,
            data_dir,
        } => cmd_serve(settings, port, input, data_dir).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        let code = e
            .downcast_ref::<PipelineError>()
            .map(PipelineError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn cmd_process(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = PipelineOptions {
        data_dir: data_dir.unwrap_or_else(|| settings.data_dir.clone()),
        output_file: output.unwrap_or_else(|| settings.output_file.clone()),
    };

    let result = run_pipeline(&options)?;

    eprintln!("\n✨ Done! {} rows from {} files", result.records.len(), result.files.len());
    Ok(())
}

fn load(settings: &Settings, input: Option<PathBuf>) -> Result<Vec<SalesRecord>, PipelineError> {
    let path = input.unwrap_or_else(|| settings.output_file.clone());
    load_sales_table(&path)
}

fn cmd_summary(
    settings: &Settings,
    input: Option<PathBuf>,
    region: &RegionFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(settings, input)?;
    let subset = filter_by_region(&table, region);
    let stats = summary_stats(&subset);

    println!("📊 Region: {}", region);
    println!("   Transactions: {}", stats.count);
    println!("   Total sales:  ${:.2}", stats.total);
    match stats.mean {
        Some(mean) => println!("   Mean sale:    ${:.2}", mean),
        None => println!("   Mean sale:    insufficient data"),
    }
    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("   Min / max:    ${:.2} / ${:.2}", min, max);
    }
    if let Some((first, last)) = date_range(&subset) {
        println!("   Dates:        {} to {}", first, last);
    }
    Ok(())
}

fn cmd_daily(
    settings: &Settings,
    input: Option<PathBuf>,
    region: &RegionFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(settings, input)?;
    let totals = daily_totals(&filter_by_region(&table, region));
    println!("{}", serde_json::to_string_pretty(&totals)?);
    Ok(())
}

fn cmd_compare(
    settings: &Settings,
    input: Option<PathBuf>,
    region: &RegionFilter,
    threshold: Option<chrono::NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(settings, input)?;
    let threshold = threshold.unwrap_or(settings.threshold_date);
    let comparison = compare_before_after(&filter_by_region(&table, region), threshold);

    println!("📈 Region: {}  Threshold: {}", region, threshold);
    println!("{}", serde_json::to_string_pretty(&comparison)?);
    println!("\n{}", comparison.headline());
    Ok(())
}

fn cmd_regions(settings: &Settings, input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(settings, input)?;
    for region in regions(&table) {
        println!("{}", region);
    }
    Ok(())
}

async fn cmd_serve(
    mut settings: Settings,
    port: Option<u16>,
    input: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        settings.port = port;
    }
    if let Some(input) = input {
        settings.output_file = input;
    }
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }

    let table = morsel::server::load_for_serving(&settings)?;
    println!("✅ Data loaded successfully: {} rows", table.len());

    morsel::server::start_server(settings, table).await
}
