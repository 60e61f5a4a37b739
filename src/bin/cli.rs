//! codecbench CLI - compression codec benchmark harness
//!
//! Usage:
//!   codecbench run [--corpus <file>] [--fixtures <dir>] [OPTIONS]
//!   codecbench list [--direction <dir>]
//!   codecbench fixtures --corpus <file> [--out-dir <dir>]
//!   codecbench generate -o <file> [--size <bytes>] [--seed <n>]

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use codecbench::{
    BenchError, BenchmarkReport, Corpus, DirectionFilter, ErrorKind, FileSource, FixtureSet,
    FixtureSource, HardwareInfo, MemoryFixtures, Registry, RunConfig, SortKey, TrialRunner,
};
use owo_colors::OwoColorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Compression codec benchmark harness
#[derive(Parser)]
#[command(name = "codecbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark and print a report
    Run(RunArgs),
    /// List the variants a run would measure
    List {
        /// Only list one direction
        #[arg(short, long, value_enum)]
        direction: Option<DirectionArg>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write the pre-compressed fixtures read by decompression variants
    Fixtures {
        /// Corpus file to compress
        #[arg(long)]
        corpus: PathBuf,

        /// Output directory (defaults to the corpus directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Write a synthetic JSON corpus
    Generate {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Minimum size in bytes
        #[arg(short, long, default_value_t = 10 * 1024 * 1024)]
        size: usize,

        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Overwrite output file if it exists
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Corpus file (a synthetic JSON corpus is generated when omitted)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Size of the generated corpus in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024, conflicts_with = "corpus")]
    generate_size: usize,

    /// Directory holding pre-compressed fixtures named after the corpus
    /// (fixtures are built in memory when omitted)
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// JSON configuration file (defaults to BENCH_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset for iteration counts
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Warm-up invocations per variant
    #[arg(long)]
    warmup: Option<usize>,

    /// Measured invocations per variant
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Only run one direction
    #[arg(short, long, value_enum)]
    direction: Option<DirectionArg>,

    /// Variant filter: full name, direction/family prefix or family (repeatable)
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// Worker threads for parallel variants
    #[arg(long)]
    threads: Option<usize>,

    /// Skip round-trip verification
    #[arg(long)]
    no_verify: bool,

    /// Report ordering
    #[arg(short, long, value_enum)]
    sort: Option<SortArg>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "table")]
    format: Format,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mode {
    /// Few iterations
    Quick,
    /// More iterations
    Full,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum DirectionArg {
    Compress,
    Decompress,
    Both,
}

impl From<DirectionArg> for DirectionFilter {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Compress => DirectionFilter::Compress,
            DirectionArg::Decompress => DirectionFilter::Decompress,
            DirectionArg::Both => DirectionFilter::Both,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum SortArg {
    Registration,
    Name,
    Mean,
    Median,
    Size,
    Ratio,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Registration => SortKey::Registration,
            SortArg::Name => SortKey::Name,
            SortArg::Mean => SortKey::Mean,
            SortArg::Median => SortKey::Median,
            SortArg::Size => SortKey::Size,
            SortArg::Ratio => SortKey::Ratio,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Format {
    /// Aligned text table
    Table,
    /// Markdown document
    Markdown,
    /// Pretty-printed JSON
    Json,
}

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_VARIANTS_FAILED: i32 = 2;
const EXIT_CONFIG: i32 = 3;
const EXIT_INTERRUPTED: i32 = 5;

static SHUTDOWN_FLAG: AtomicBool = AtomicBool::new(false);

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::List { direction, config } => handle_list(direction, config.as_deref()),
        Commands::Fixtures { corpus, out_dir } => handle_fixtures(&corpus, out_dir.as_deref()),
        Commands::Generate {
            output,
            size,
            seed,
            force,
        } => handle_generate(&output, size, seed, force),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);

            let exit_code = match e.downcast_ref::<BenchError>().map(BenchError::kind) {
                Some(ErrorKind::Configuration) => EXIT_CONFIG,
                _ => EXIT_ERROR,
            };
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn install_interrupt_handler(quiet: bool) {
    let result = ctrlc::set_handler(move || {
        SHUTDOWN_FLAG.store(true, Ordering::SeqCst);
        if !quiet {
            eprintln!(
                "\n{} finishing the current variant, then writing a partial report",
                "Interrupted:".bright_yellow().bold()
            );
        }
    });
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }
}

/// Configuration file or environment, then command-line overrides.
fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display())),
        None => Ok(RunConfig::from_env()?),
    }
}

fn apply_overrides(config: &mut RunConfig, args: &RunArgs) {
    if let Some(mode) = args.mode {
        let preset = match mode {
            Mode::Quick => RunConfig::quick(),
            Mode::Full => RunConfig::full(),
        };
        config.warmup_iterations = preset.warmup_iterations;
        config.measured_iterations = preset.measured_iterations;
    }
    if let Some(warmup) = args.warmup {
        config.warmup_iterations = warmup;
    }
    if let Some(iterations) = args.iterations {
        config.measured_iterations = iterations;
    }
    if let Some(direction) = args.direction {
        config.direction = direction.into();
    }
    if !args.variants.is_empty() {
        config.variants = Some(args.variants.clone());
    }
    if let Some(threads) = args.threads {
        config.codecs.threads = Some(threads);
    }
    if args.no_verify {
        config.verify = false;
    }
    if let Some(sort) = args.sort {
        config.sort = sort.into();
    }
}

fn handle_run(args: RunArgs) -> Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let mut registry = Registry::standard(&config.codecs)?;
    registry.retain(|variant| config.should_run(variant));
    if registry.is_empty() {
        bail!(BenchError::Configuration(
            "no variant matches the direction and variant filters".to_string()
        ));
    }

    let corpus = match &args.corpus {
        Some(path) => Corpus::from_source(&FileSource::new(path))
            .with_context(|| format!("Failed to load corpus: {}", path.display()))?,
        None => Corpus::from_bytes(
            format!("synthetic-{}.json", args.generate_size),
            codecbench::synthetic_json(args.generate_size, 42),
        ),
    };

    if !args.quiet {
        println!(
            "{} {} ({}), {} variants, {} warm-up + {} measured each",
            "Corpus:".bright_cyan(),
            corpus.name(),
            format_bytes(corpus.len() as u64),
            registry.len(),
            config.warmup_iterations,
            config.measured_iterations
        );
    }

    let needs_fixtures = config.direction != DirectionFilter::Compress;
    let fixtures: Box<dyn FixtureSource> = match (&args.fixtures, needs_fixtures) {
        (Some(dir), _) => {
            let stem = args
                .corpus
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| corpus.name().to_string());
            Box::new(FixtureSet::new(dir, stem))
        }
        (None, true) => {
            if !args.quiet {
                println!("{} building reference fixtures in memory...", "Fixtures:".bright_cyan());
            }
            Box::new(MemoryFixtures::reference(&corpus).context("Failed to build fixtures")?)
        }
        (None, false) => Box::new(MemoryFixtures::new()),
    };

    install_interrupt_handler(args.quiet);

    let start = Instant::now();
    let results = TrialRunner::new(&config, &corpus)
        .with_fixtures(fixtures.as_ref())
        .with_shutdown(&SHUTDOWN_FLAG)
        .run(&registry)?;
    let elapsed = start.elapsed();

    let report = BenchmarkReport::new(&corpus, &config, results, HardwareInfo::collect());
    let rendered = match args.format {
        Format::Table => report.render_table(config.sort),
        Format::Markdown => report.render_markdown(config.sort),
        Format::Json => report.render_json().context("Failed to serialize report")?,
    };

    match &args.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("Failed to write report: {}", path.display()))?,
        None => print!("{}", rendered),
    }

    if !args.quiet {
        print_summary(&report, elapsed, args.output.as_deref());
    }

    Ok(if report.interrupted {
        EXIT_INTERRUPTED
    } else if report.failed() > 0 {
        EXIT_VARIANTS_FAILED
    } else {
        EXIT_SUCCESS
    })
}

fn print_summary(report: &BenchmarkReport, elapsed: Duration, output: Option<&Path>) {
    println!();
    if report.interrupted {
        println!(
            "{} {} variants skipped",
            "Interrupted:".bright_yellow().bold(),
            report.skipped()
        );
    }
    if report.failed() > 0 {
        println!(
            "{} {} of {} variants failed",
            "Warning:".bright_red().bold(),
            report.failed(),
            report.measurements.len()
        );
    }
    print!(
        "{} {} variants completed in {}",
        "Done:".bright_green().bold(),
        report.completed(),
        format_duration(elapsed)
    );
    if let Some(path) = output {
        print!(", report written to {}", path.display());
    }
    println!();
}

fn handle_list(direction: Option<DirectionArg>, config_path: Option<&Path>) -> Result<i32> {
    let mut config = load_config(config_path)?;
    if let Some(direction) = direction {
        config.direction = direction.into();
    }
    config.validate()?;

    let registry = Registry::standard(&config.codecs)?;
    for entry in registry.iter().filter(|e| config.should_run(e.variant())) {
        println!("{}", entry.variant().name());
    }
    Ok(EXIT_SUCCESS)
}

fn handle_fixtures(corpus_path: &Path, out_dir: Option<&Path>) -> Result<i32> {
    let corpus = Corpus::from_source(&FileSource::new(corpus_path))
        .with_context(|| format!("Failed to load corpus: {}", corpus_path.display()))?;

    let set = match out_dir {
        Some(dir) => FixtureSet::new(dir, corpus.name()),
        None => FixtureSet::beside(corpus_path),
    };

    println!(
        "{} compressing {} ({}) with reference settings...",
        "Fixtures:".bright_cyan(),
        corpus.name(),
        format_bytes(corpus.len() as u64)
    );
    let start = Instant::now();
    let written = set.write_reference(&corpus)?;

    for path in &written {
        let size = fs::metadata(path)
            .with_context(|| format!("Failed to stat fixture: {}", path.display()))?
            .len();
        println!("   {} ({})", path.display(), format_bytes(size));
    }
    println!(
        "{} wrote {} fixtures in {}",
        "Success:".bright_green().bold(),
        written.len(),
        format_duration(start.elapsed())
    );
    Ok(EXIT_SUCCESS)
}

fn handle_generate(output: &Path, size: usize, seed: u64, force: bool) -> Result<i32> {
    if output.exists() && !force {
        bail!(
            "Output file already exists: {}\n   Use --force to overwrite",
            output.display()
        );
    }

    let data = codecbench::synthetic_json(size, seed);
    fs::write(output, &data)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    println!(
        "{} Created {} ({})",
        "Success:".bright_green().bold(),
        output.display(),
        format_bytes(data.len() as u64)
    );
    Ok(EXIT_SUCCESS)
}

// ============================================================================
// Utilities
// ============================================================================

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.1}µs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_use_the_report_micro_sign() {
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert!(codecbench::report::format_nanos(1_500.0).ends_with("µs"));
        assert_eq!(format_duration(Duration::from_nanos(999)), "999ns");
        assert_eq!(format_duration(Duration::from_millis(2)), "2.00ms");
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2 * 1024 * 1024), "2.0 MB");
    }
}
