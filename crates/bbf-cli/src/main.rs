// crates/bbf-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use bbf_core::{Grid, NullObserver, SearchConfig, TracingObserver};
use bbf_format::{
    io::{read_versioned_auto, write_versioned_auto, Versioned, FORMAT_VERSION},
    program, HistogramBucket, ResumeVectorRecord, SearchResultRecord,
};
use bbf_scheduler::{run_search, SearchReport};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "bbf",
    about = "Busy beaver grid-program searcher",
    long_about = "Busy beaver grid-program searcher.\n\nExhaustively searches W x H grid programs for the one that runs longest before halting, and can replay or inspect individual programs.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Exhaustively search all W x H grid programs, optionally resuming
    /// from a previously saved resume vector.
    Search {
        /// Grid width (1..=8)
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u8).range(1..=8))]
        width: u8,

        /// Grid height (1..=8)
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u8).range(1..=8))]
        height: u8,

        /// Data tape size
        #[arg(long, default_value_t = SearchConfig::DEFAULT_DATA_SIZE)]
        data_size: usize,

        /// Per-run step budget before a branch is assumed hanging
        #[arg(long)]
        max_steps_per_run: Option<u32>,

        /// Total step budget across the whole search
        #[arg(long)]
        max_steps_total: Option<u64>,

        /// Resume vector file to fast-forward past before exploring
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Output path for the search result record (JSON/CBOR)
        #[arg(long, default_value = "result.json")]
        out: PathBuf,

        /// Log every terminal branch outcome at debug level
        #[arg(long)]
        verbose: bool,
    },

    /// Replay one finalized program through the block-graph executor and
    /// report its exact step count without running any hang detector.
    Replay {
        /// Program in its compact textual encoding
        #[arg(long)]
        program: String,

        /// Data tape size
        #[arg(long, default_value_t = SearchConfig::DEFAULT_DATA_SIZE)]
        data_size: usize,

        /// Per-replay step budget
        #[arg(long, default_value_t = (SearchConfig::DEFAULT_DATA_SIZE as u32).saturating_mul(4))]
        max_steps_per_run: u32,
    },

    /// Encode a program written as rows of `?` (Unset), `_` (Noop), `o`
    /// (Data), `*` (Turn), bottom row first, into its compact textual form.
    Encode {
        /// Path to a plain-text grid, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,
    },

    /// Decode a compact textual program back into its plain-text grid form.
    Decode {
        /// Program in its compact textual encoding
        program: String,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Search {
            width,
            height,
            data_size,
            max_steps_per_run,
            max_steps_total,
            resume,
            out,
            verbose,
        } => search(width, height, data_size, max_steps_per_run, max_steps_total, resume, out, verbose),

        Cmd::Replay {
            program,
            data_size,
            max_steps_per_run,
        } => replay(program, data_size, max_steps_per_run),

        Cmd::Encode { input } => encode(&input),

        Cmd::Decode { program } => decode(&program),
    }
}

#[allow(clippy::too_many_arguments)]
fn search(
    width: u8,
    height: u8,
    data_size: usize,
    max_steps_per_run: Option<u32>,
    max_steps_total: Option<u64>,
    resume: Option<PathBuf>,
    out: PathBuf,
    verbose: bool,
) -> Result<()> {
    let max_steps_per_run = max_steps_per_run.unwrap_or_else(|| (data_size as u32).saturating_mul(4));
    let max_steps_total = max_steps_total.unwrap_or(u64::from(max_steps_per_run) * 64);
    let config = SearchConfig::new(
        width,
        height,
        data_size,
        max_steps_per_run,
        max_steps_total,
        SearchConfig::DEFAULT_HANG_SAMPLE_PERIOD,
    )
    .context("building search config")?;

    let resume_vector = resume
        .as_deref()
        .map(|path| load_resume_vector(path, width, height))
        .transpose()?;

    let report = if verbose {
        let mut observer = TracingObserver;
        run_search(config, resume_vector.as_deref(), &mut observer)
    } else {
        let mut observer = NullObserver;
        run_search(config, resume_vector.as_deref(), &mut observer)
    };

    info!(best_steps = report.best_steps, total_done = report.total_done, "search finished");

    let record = to_record(width, height, data_size, &report);
    write_versioned_auto(&out, &Versioned::new(FORMAT_VERSION, record)).context("writing search result")?;
    println!("best: {} steps, written to {}", report.best_steps, out.display());
    Ok(())
}

fn to_record(width: u8, height: u8, data_size: usize, report: &SearchReport) -> SearchResultRecord {
    let histogram: Vec<HistogramBucket> = report.histogram.buckets();
    SearchResultRecord {
        width,
        height,
        data_size,
        best_steps: report.best_steps,
        best_program: report.best_program.as_ref().map(program::encode),
        total_done: report.total_done,
        total_errors: report.total_errors,
        total_hangs_detected: report.total_hangs_detected,
        total_hangs_assumed: report.total_hangs_assumed,
        histogram,
        total_budget_exceeded: report.total_budget_exceeded,
    }
}

fn load_resume_vector(path: &Path, width: u8, height: u8) -> Result<Vec<u8>> {
    let wrapped: Versioned<ResumeVectorRecord> =
        read_versioned_auto(path).with_context(|| format!("reading resume vector {}", path.display()))?;
    let record = wrapped.payload;
    anyhow::ensure!(
        record.width == width && record.height == height,
        "resume vector was recorded for a {}x{} grid, not {width}x{height}",
        record.width,
        record.height
    );
    Ok(record.choices)
}

fn replay(program: String, data_size: usize, max_steps_per_run: u32) -> Result<()> {
    let grid = program::decode(&program).context("decoding program")?;
    let config = SearchConfig::new(
        grid.width(),
        grid.height(),
        data_size,
        max_steps_per_run,
        u64::from(max_steps_per_run),
        SearchConfig::DEFAULT_HANG_SAMPLE_PERIOD,
    )
    .context("building replay config")?;

    let mut observer = TracingObserver;
    let outcome = bbf_fastexec::replay(grid, config, &mut observer);
    println!("{outcome:?}");
    Ok(())
}

fn encode(input: &str) -> Result<()> {
    let text = if input == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading program from stdin")?
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    };
    let grid = Grid::from_plain_rows(&text).context("parsing plain-text grid")?;
    println!("{}", program::encode(&grid));
    Ok(())
}

fn decode(program: &str) -> Result<()> {
    let grid = program::decode(program).context("decoding program")?;
    let plain = grid.to_plain_string();
    for row in plain.as_bytes().chunks(usize::from(grid.width())) {
        println!("{}", String::from_utf8_lossy(row));
    }
    Ok(())
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
