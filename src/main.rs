use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use synctrace::Skeleton;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "synctrace - post-mortem lock-graph deadlock analyzer"
)]
struct Cli {
    /// Path to a repository previously recorded with `Recorder`.
    repo_path: PathBuf,

    /// Print thread and lock counts instead of full diagnostics.
    #[arg(long)]
    stats: bool,

    /// Write output to FILE instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Raise the log level (framework lifecycle and graph construction
    /// progress printed to stderr).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();

    let skeleton = Skeleton::load(&cli.repo_path)
        .with_context(|| format!("failed to load repository at {}", cli.repo_path.display()))?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    if cli.stats {
        writeln!(out, "number of threads: {}", skeleton.number_of_threads())?;
        writeln!(out, "number of distinct locks: {}", skeleton.number_of_locks())?;
        return Ok(());
    }

    // Printing potential deadlocks is the default action when --stats isn't given.
    let deadlocks = skeleton.deadlocks();
    if deadlocks.is_empty() {
        writeln!(out, "no potential deadlocks found")?;
        return Ok(());
    }

    let rule = "-".repeat(72);
    for (i, deadlock) in deadlocks.iter().enumerate() {
        if i > 0 {
            writeln!(out, "{rule}")?;
        }
        write!(out, "{deadlock}")?;
    }

    Ok(())
}
