//! CLI entry point for the next-train board.
//!
//! Provides subcommands for a one-off board, a refreshing board, and looking
//! up stop ids in a GTFS `stops.txt`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use next_train::config::{FeedArgs, StopArgs, refresh_interval};
use next_train::output::{JsonSink, TextSink};
use next_train::scheduler::{DisplaySink, RefreshScheduler, refresh};
use next_train::stops::find_stops;
use std::ffi::OsStr;
use std::io::IsTerminal;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "next_train")]
#[command(about = "Shows the next predicted arrivals at a transit stop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed once and print the next arrivals
    Next {
        #[command(flatten)]
        stop: StopArgs,

        #[command(flatten)]
        feed: FeedArgs,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Keep the board refreshed on a fixed interval
    Watch {
        #[command(flatten)]
        stop: StopArgs,

        #[command(flatten)]
        feed: FeedArgs,

        /// Refresh interval in seconds
        #[arg(short = 'r', long, env = "REFRESH_RATE", default_value_t = 60)]
        refresh_rate: u64,

        /// Number of refreshes to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        cycles: usize,

        /// Print JSON lines instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Find stop ids by station name in a GTFS stops.txt
    FindStop {
        /// Part of the station name, e.g. "Grand St"
        name: String,

        /// Path to the GTFS static stops.txt
        #[arg(short, long, default_value = "stops.txt")]
        stops_file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/next_train.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("next_train.log"));

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
        Commands::Next { stop, feed, json } => {
            let request = stop.request()?;
            let source = feed.snapshot_source()?;
            info!(source = %source.describe(), stop_id = %request.target_stop(), "Fetching board");

            let outcome = refresh(source.as_ref(), &request).await;
            display_sink(json).render(1, &outcome)?;
            outcome?;
        }
        Commands::Watch {
            stop,
            feed,
            refresh_rate,
            cycles,
            json,
        } => {
            let request = stop.request()?;
            let interval = refresh_interval(refresh_rate)?;
            let source = feed.snapshot_source()?;

            let mut sink = display_sink(json);
            let summary = RefreshScheduler::new(interval)?
                .with_cycles(cycles)
                .run(source.as_ref(), &request, sink.as_mut())
                .await;

            if summary.succeeded == 0 && summary.cycles > 0 {
                warn!(cycles = summary.cycles, "No refresh cycle produced a board");
            }
        }
        Commands::FindStop { name, stops_file } => {
            let stops = find_stops(&stops_file, &name)?;

            for stop in &stops {
                info!(
                    stop_id = %stop.stop_id,
                    stop_name = %stop.stop_name,
                    parent_station = stop.parent_station.as_deref().unwrap_or(""),
                    "Stop"
                );
            }

            info!(query = %name, found = stops.len(), "Stop lookup summary");
        }
    }

    Ok(())
}

/// Picks the board renderer for stdout.
fn display_sink(json: bool) -> Box<dyn DisplaySink> {
    let stdout = std::io::stdout();
    if json {
        Box::new(JsonSink::new(stdout))
    } else {
        let color = stdout.is_terminal();
        Box::new(TextSink::new(stdout).with_color(color))
    }
}
