// src/main.rs
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

use feedbook::decoder::Decoder;
use feedbook::pipeline::{self, PipelineConfig};
use feedbook::wire::Symbol;

#[derive(Parser, Debug)]
#[command(name = "feedbook", version, about = "Reconstruct per-symbol order books from a binary feed file")]
struct Cli {
    /// Input binary feed file.
    #[arg(long)]
    input: PathBuf,

    /// Comma-separated list of symbols to process.
    #[arg(long)]
    symbols: String,

    /// Top-of-book publish interval in microseconds.
    #[arg(long = "publish-top-of-book-us", default_value_t = 1000)]
    publish_top_of_book_us: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(io::stderr)
        .init();

    // stdout is the CSV sink and exit codes are part of the interface:
    // usage errors are 1, --help/--version are 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let symbols: Vec<Symbol> = cli
        .symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect();
    if symbols.is_empty() {
        bail!("--symbols must name at least one symbol");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .context("install signal handler")?;
    }

    let mut decoder = Decoder::open(&cli.input)?;
    info!(
        input = %cli.input.display(),
        bytes = decoder.size(),
        symbols = %cli.symbols,
        "feed opened"
    );

    let config = PipelineConfig {
        publish_interval_us: cli.publish_top_of_book_us,
        ..Default::default()
    };

    let stdout = io::stdout();
    let report = pipeline::run(&mut decoder, &symbols, &config, &shutdown, stdout.lock())?;

    report
        .write_summary(&mut io::stderr().lock())
        .context("write final statistics")?;
    Ok(())
}
