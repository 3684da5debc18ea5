use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task;
use wtd::{
    Consolidator, DarkSkyClient, Fetcher, GoogleGeocoder, PayloadCache, Reporter, Settings,
    WtdError,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch weather observations for every day of a year and cache them
    /// as raw/<location>/<year>/<doy>.json files. Re-running only fetches
    /// days that are not cached yet.
    Fetch {
        /// Name of the location
        location: String,
        /// Observations year to download
        year: i32,
        /// Cache root for the raw per-day payloads
        #[arg(long, default_value = "data/raw")]
        output: PathBuf,
    },
    /// Consolidate raw daily data from <input>/<location>/<year>/*.json
    /// into <output>/<location>_daily.csv and <location>_daily.parquet.
    Consolidate {
        /// Cache root holding the raw per-day payloads
        #[arg(default_value = "data/raw")]
        input: PathBuf,
        /// Directory for the consolidated datasets
        #[arg(default_value = "data/interim")]
        output: PathBuf,
    },
}

/// Minimal stderr logger in the classic "time - target - level - message"
/// format, so library log output and progress bars stay separable.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Console progress bar behind the [`Reporter`] seam.
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Reporter for BarReporter {
    fn begin(&self, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_style(ProgressStyle::default_bar());
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn advance(&self, delta: u64) {
        self.bar.inc(delta);
    }
}

async fn run(cli: Cli) -> Result<(), WtdError> {
    match cli.command {
        Command::Fetch {
            location,
            year,
            output,
        } => {
            let settings = Settings::from_env()?;
            let fetcher = Fetcher::new(
                GoogleGeocoder::new(settings.maps_key),
                DarkSkyClient::new(settings.darksky_key),
                PayloadCache::new(output),
                settings.units,
            );
            println!("\nFetching the data from Dark Sky API:");
            let reporter = BarReporter::new();
            let summary = fetcher.run(&location, year, &reporter).await?;
            println!(
                "{} {}: fetched {} days, {} already cached",
                location, year, summary.fetched, summary.skipped
            );
        }
        Command::Consolidate { input, output } => {
            let consolidator = Consolidator::new(input, output);
            let reporter: Arc<dyn Reporter> = Arc::new(BarReporter::new());
            task::spawn_blocking(move || consolidator.run(reporter.as_ref())).await??;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
