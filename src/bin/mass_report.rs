use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use rusty_mass::analysis::{analyze_file, ViewMode};
use rusty_mass::config::{AppConfig, DEFAULT_CONFIG_PATH};

/// Aggregate one measurement file and print the `{plots, statistics}`
/// response as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input file (.csv, .txt, .tsv, .parquet)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Histogram bin count (non-positive means default)
    #[arg(long, allow_negative_numbers = true)]
    bins: Option<i64>,

    /// Logarithmic mass axis
    #[arg(long, default_value_t = false)]
    log_scale: bool,

    /// Plot groups: all, dilepton, fourlepton, diphoton
    #[arg(long)]
    view: Option<ViewMode>,

    /// Restrict a Parquet input to one group
    #[arg(long)]
    group: Option<String>,

    /// Path to config TOML
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Pretty-print the JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();
    let config = AppConfig::load_or_default(&args.config);

    let mut request = config.analysis.request();
    if args.bins.is_some() {
        request.bin_count = args.bins;
    }
    request.log_scale |= args.log_scale;
    if let Some(view) = args.view {
        request.view_mode = view;
    }
    request.group_id = args.group;

    match analyze_file(&args.path, &request) {
        Ok(result) => {
            println!("{}", to_json(&result, args.pretty)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::error!("{} ({})", e, e.status());
            println!("{}", to_json(&e.to_body(), args.pretty)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
