//! `racetrend` command line: builds charts and summaries from a stored race history.

use clap::{Parser, Subcommand, ValueEnum};
use racetrend::{
    app_dirs::AppDirs,
    chart::{animated_accuracy_histogram, animated_speed_histogram, ChartKind},
    config::{AnalyticsConfig, ConfigStore, FileConfigStore},
    daily::aggregate,
    personal_best::{track, PbMode},
    store::{DelimitedFileStore, RecordStore, SqliteStore},
    util::mean,
    RecordSequence,
};
use serde::Serialize;
use std::{error::Error, io, path::PathBuf};
use tracing::debug;

/// trend lines, personal bests and distributions for your typing-race history
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Derives chart-ready series (smoothed trends, personal-best trajectories, histograms, correlation scatters and daily aggregates) from a typing-race history and prints them as JSON."
)]
pub struct Cli {
    /// semicolon-delimited race file (newest race first)
    #[clap(short = 'f', long, global = true)]
    file: Option<PathBuf>,

    /// read races from an SQLite database instead of a race file
    #[clap(long, global = true, conflicts_with = "file")]
    db: Option<PathBuf>,

    /// config file to load tunables from
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print a chart description
    Chart {
        #[clap(value_enum)]
        kind: ChartKind,

        /// trailing window of the running average (0 hides it)
        #[clap(short = 'w', long)]
        window: Option<usize>,

        /// personal-best presentation
        #[clap(long, value_enum)]
        pb_mode: Option<PbMode>,

        /// hide the overall average line
        #[clap(long)]
        no_average: bool,

        /// hide the personal-best trajectory
        #[clap(long)]
        no_pb: bool,

        /// point count above which scatter charts are decimated
        #[clap(long)]
        decimation_threshold: Option<usize>,
    },

    /// print per-day race counts and best/worst/average speed
    Daily,

    /// print headline numbers: races, average, personal best
    Summary,

    /// print a frame-by-frame histogram animation
    Animate {
        #[clap(value_enum)]
        metric: AnimatedMetric,

        /// races revealed per frame (default: about 36 frames in total)
        #[clap(long)]
        frame_step: Option<usize>,

        /// playback length in seconds
        #[clap(long)]
        duration: Option<u32>,
    },

    /// copy the race history into an SQLite database
    Import {
        /// database to write
        #[clap(long)]
        to: PathBuf,
    },

    /// write the effective configuration to the config file
    SaveConfig,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
enum AnimatedMetric {
    Accuracy,
    Speed,
}

#[derive(Debug, Serialize)]
struct Summary {
    races: usize,
    first_attempt: u64,
    last_attempt: u64,
    average_speed: f64,
    average_accuracy: f64,
    best_speed: f64,
    best_speed_attempt: u64,
    personal_bests: usize,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn load_races(&self) -> Result<RecordSequence, Box<dyn Error>> {
        if let Some(db) = &self.db {
            debug!(path = %db.display(), "reading races from database");
            return Ok(SqliteStore::open(db)?.load()?);
        }
        let path = self
            .file
            .clone()
            .or_else(AppDirs::races_path)
            .ok_or("no race file given and no default location available")?;
        debug!(path = %path.display(), "reading races from file");
        Ok(DelimitedFileStore::with_path(path).load()?)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}

fn summarize(seq: &RecordSequence) -> Result<Summary, Box<dyn Error>> {
    let speeds = seq.speeds();
    let pb = track(&seq.attempts(), &speeds, PbMode::Gradual)?;
    let best = pb.best().ok_or("no personal best in a non-empty history")?;
    Ok(Summary {
        races: seq.len(),
        first_attempt: seq.first().attempt,
        last_attempt: seq.last().attempt,
        average_speed: mean(&speeds).unwrap_or_default(),
        average_accuracy: mean(&seq.accuracies()).unwrap_or_default(),
        best_speed: best.value,
        best_speed_attempt: best.attempt,
        personal_bests: pb.records.len(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let store = cli.config_store();
    let mut cfg: AnalyticsConfig = store.load();

    match &cli.command {
        Command::Chart {
            kind,
            window,
            pb_mode,
            no_average,
            no_pb,
            decimation_threshold,
        } => {
            if let Some(window) = window {
                cfg.average_window = *window;
            }
            if let Some(mode) = pb_mode {
                cfg.pb_mode = *mode;
            }
            if let Some(threshold) = decimation_threshold {
                cfg.decimation_threshold = *threshold;
            }
            cfg.show_average &= !no_average;
            cfg.show_pb &= !no_pb;

            let seq = cli.load_races()?;
            print_json(&kind.build(&seq, &cfg)?)?;
        }
        Command::Daily => {
            let seq = cli.load_races()?;
            print_json(&aggregate(&seq))?;
        }
        Command::Summary => {
            let seq = cli.load_races()?;
            print_json(&summarize(&seq)?)?;
        }
        Command::Animate {
            metric,
            frame_step,
            duration,
        } => {
            if let Some(duration) = duration {
                cfg.animation_duration_secs = *duration;
            }
            let seq = cli.load_races()?;
            let animation = match metric {
                AnimatedMetric::Accuracy => animated_accuracy_histogram(&seq, *frame_step, &cfg)?,
                AnimatedMetric::Speed => animated_speed_histogram(&seq, *frame_step, &cfg)?,
            };
            debug!(metric = %metric, frames = animation.frames.len(), "built animation");
            print_json(&animation)?;
        }
        Command::Import { to } => {
            let seq = cli.load_races()?;
            SqliteStore::open(to)?.save(&seq)?;
            eprintln!("imported {} races into {}", seq.len(), to.display());
        }
        Command::SaveConfig => {
            store.save(&cfg)?;
            eprintln!("wrote {}", store.path().display());
        }
    }

    Ok(())
}
