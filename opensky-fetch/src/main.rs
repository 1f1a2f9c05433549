//! opensky: fetch and decode OpenSky state vectors for a region.
//!
//! Supports:
//! - Fetching live state vectors for a named region or bounding box
//! - Capturing the raw response body to a file
//! - Decoding previously captured documents from a file or stdin

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::info;

use opensky_core::config::{self, Config};
use opensky_core::query::{self, BoundingBox};
use opensky_core::DecodeOutcome;

mod fetch;
mod render;
mod sink;

use fetch::FeedClient;
use sink::RawSink;

#[derive(Parser)]
#[command(
    name = "opensky",
    version,
    about = "OpenSky state vector fetcher and decoder"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current state vectors and print them
    Fetch {
        /// Named region (bjarred, switzerland, new-jersey)
        #[arg(long, conflicts_with = "bbox")]
        region: Option<String>,

        /// Bounding box as LAMIN,LOMIN,LAMAX,LOMAX
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,

        /// Feed endpoint
        #[arg(long, env = "OPENSKY_BASE_URL")]
        base_url: Option<String>,

        /// Write the raw response body to this file
        #[arg(long)]
        raw_out: Option<PathBuf>,

        /// Print labeled lines per aircraft instead of a table
        #[arg(short, long)]
        lines: bool,
    },

    /// Decode a captured feed document (use - for stdin)
    Decode {
        file: PathBuf,

        /// Print labeled lines per aircraft instead of a table
        #[arg(short, long)]
        lines: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fetch {
            region,
            bbox,
            base_url,
            raw_out,
            lines,
        } => cmd_fetch(region, bbox, base_url, raw_out, lines).await,
        Commands::Decode { file, lines } => cmd_decode(file, lines),
        Commands::Config { init } => cmd_config(init),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}

/// Region from `--region`/`--bbox`, else the configured one.
fn resolve_region(
    region: Option<String>,
    bbox: Option<String>,
    config: &Config,
) -> Result<BoundingBox, String> {
    if let Some(name) = region {
        return query::region(&name).ok_or_else(|| {
            let known: Vec<&str> = query::REGIONS.iter().map(|(n, _)| *n).collect();
            format!("unknown region {name:?} (known: {})", known.join(", "))
        });
    }
    if let Some(text) = bbox {
        return BoundingBox::parse(&text).map_err(|e| e.to_string());
    }
    config.region.validate().map_err(|e| e.to_string())?;
    Ok(config.region)
}

async fn cmd_fetch(
    region: Option<String>,
    bbox: Option<String>,
    base_url: Option<String>,
    raw_out: Option<PathBuf>,
    lines: bool,
) {
    let config = config::load_config();
    let bbox = resolve_region(region, bbox, &config).unwrap_or_else(|e| fail(e));
    let base_url = base_url.unwrap_or_else(|| config.feed.base_url.clone());

    let client = FeedClient::new(&base_url, Duration::from_secs(config.feed.timeout_secs))
        .unwrap_or_else(|e| fail(e));
    let url = client.query_url(&bbox, config.feed.extended);
    info!("feed endpoint {}", client.base_url());
    info!("HttpRequest = {url}");

    let text = client.fetch(&url).await.unwrap_or_else(|e| fail(e));

    let raw_path = raw_out.or_else(|| config.output.raw_path.as_ref().map(PathBuf::from));
    if let Some(path) = raw_path {
        let sink = RawSink::new(path);
        match sink.write(text.as_bytes()) {
            Ok(()) => info!("raw response saved to {}", sink.path().display()),
            Err(e) => eprintln!("Warning: could not write {}: {e}", sink.path().display()),
        }
    }

    let outcome = report(&text, lines);
    let outside = outcome
        .snapshot
        .vectors
        .iter()
        .filter_map(|sv| sv.position())
        .filter(|&(lat, lon)| !bbox.contains(lat, lon))
        .count();
    if outside > 0 {
        info!("{outside} aircraft reported outside the requested box");
    }
}

fn cmd_decode(file: PathBuf, lines: bool) {
    let text = if file.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fail(format!("reading stdin: {e}")));
        buf
    } else {
        std::fs::read_to_string(&file)
            .unwrap_or_else(|e| fail(format!("opening {}: {e}", file.display())))
    };

    report(&text, lines);
}

fn cmd_config(init: bool) {
    if init {
        match config::save_config(&Config::default()) {
            Ok(path) => println!("Wrote {}", path.display()),
            Err(e) => fail(e),
        }
        return;
    }

    let path = config::config_file();
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "defaults".to_string()
    };
    println!("# source: {source}");
    print!("{}", config::serialize_config(&config::load_config()));
}

/// Decode a document and print it; rejected vectors go to stderr.
fn report(text: &str, lines: bool) -> DecodeOutcome {
    let outcome = opensky_core::decode_str(text).unwrap_or_else(|e| fail(e));

    if lines {
        print!("{}", render::format_lines(&outcome.snapshot));
    } else {
        println!();
        println!("{}", render::format_summary(&outcome));
        println!();
        if !outcome.snapshot.vectors.is_empty() {
            println!("{}", render::format_table(&outcome.snapshot));
        }
    }

    for (index, err) in &outcome.rejected {
        eprintln!("  rejected state vector {index}: {err}");
    }
    outcome
}
