//! popstat CLI - population statistics CSV ingestion
//!
//! ```bash
//! popstat parse data.csv                      # Parse CSV to JSON
//! popstat classify data.csv                   # Detect date/region/value columns
//! popstat view data.csv --region 서울특별시    # Chart-ready series + stats
//! popstat summary https://example.com/a.csv   # Descriptive statistics
//! popstat serve --port 3000                   # Start HTTP server
//! ```
//!
//! `SOURCE` arguments accept a file path or an `http(s)://` URL.

use clap::{Parser, Subcommand};
use popstat::{
    build_view, classify, fetch_bytes, ingest_bytes, is_url, parse_bytes_auto,
    validate_classification, Config, DashboardView, ViewOptions,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "popstat")]
#[command(about = "Read population statistics CSVs and prepare chart data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV and output its rows as JSON
    Parse {
        /// CSV file path or URL
        source: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect the date, region and value columns
    Classify {
        /// CSV file path or URL
        source: String,
    },

    /// Build the dashboard view (series, comparison, statistics)
    View {
        /// CSV file path or URL
        source: String,

        /// Value column to chart (default: first value column)
        #[arg(short, long)]
        column: Option<String>,

        /// Region to include (repeatable; default: first regions)
        #[arg(short, long = "region")]
        regions: Vec<String>,

        /// Value column to compare (repeatable; two or more produce long form)
        #[arg(long = "compare")]
        compare: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print descriptive statistics of the selected regions
    Summary {
        /// CSV file path or URL
        source: String,

        /// Region to include (repeatable; default: first regions)
        #[arg(short, long = "region")]
        regions: Vec<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: POPSTAT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { source, output } => cmd_parse(&source, output.as_deref(), &config).await,

        Commands::Classify { source } => cmd_classify(&source, &config).await,

        Commands::View {
            source,
            column,
            regions,
            compare,
            output,
        } => {
            let options = view_options(&config, column, regions, compare);
            cmd_view(&source, &options, output.as_deref(), &config).await
        }

        Commands::Summary { source, regions } => {
            let options = view_options(&config, None, regions, Vec::new());
            cmd_summary(&source, &options, &config).await
        }

        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            popstat::server::start_server(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn view_options(
    config: &Config,
    column: Option<String>,
    regions: Vec<String>,
    compare: Vec<String>,
) -> ViewOptions {
    ViewOptions {
        target_column: column,
        regions: (!regions.is_empty()).then_some(regions),
        compare_columns: compare,
        default_regions: config.default_regions,
        ..ViewOptions::default()
    }
}

/// Read raw bytes from a path or URL.
async fn read_source(source: &str, timeout: Option<Duration>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if is_url(source) {
        Ok(fetch_bytes(source, timeout).await?)
    } else {
        Ok(fs::read(source)?)
    }
}

async fn cmd_parse(
    source: &str,
    output: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", source);

    let bytes = read_source(source, config.fetch_timeout).await?;
    let result = parse_bytes_auto(&bytes)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", popstat::format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers().join(", "));
    eprintln!("✅ Parsed {} rows", result.table.row_count());

    let json = serde_json::to_string_pretty(&result.table)?;
    write_output(&json, output)
}

async fn cmd_classify(source: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_source(source, config.fetch_timeout).await?;
    let result = parse_bytes_auto(&bytes)?;
    let headers = result.headers();
    let classification = classify(headers.as_slice());

    println!("{}", serde_json::to_string_pretty(&classification)?);
    validate_classification(&classification)?;
    Ok(())
}

async fn load_view(
    source: &str,
    options: &ViewOptions,
    config: &Config,
) -> Result<DashboardView, Box<dyn std::error::Error>> {
    let bytes = read_source(source, config.fetch_timeout).await?;
    let ingested = ingest_bytes(&bytes, None)?;
    Ok(build_view(&ingested, options)?)
}

async fn cmd_view(
    source: &str,
    options: &ViewOptions,
    output: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = load_view(source, options, config).await?;
    let json = serde_json::to_string_pretty(&view)?;
    write_output(&json, output)
}

async fn cmd_summary(
    source: &str,
    options: &ViewOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = load_view(source, options, config).await?;

    if !view.selected_regions.is_empty() {
        println!("Regions: {}\n", view.selected_regions.join(", "));
    }
    if view.summary.is_empty() {
        println!("(no numeric columns)");
        return Ok(());
    }

    println!(
        "{:<20} {:>8} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in &view.summary {
        let std = s.std.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:>8} {:>14.2} {:>14} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            s.column, s.count, s.mean, std, s.min, s.p25, s.p50, s.p75, s.max
        );
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
