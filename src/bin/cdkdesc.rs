use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cdkdesc::batch::{BatchRunner, RunStatus};
use cdkdesc::config::{Delimiter, Options};
use cdkdesc::{init_logging, FingerprintKind};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(
    name = "cdkdesc",
    about = "Computes molecular fingerprints for every structure in a SMILES or SD file.",
    version,
    author
)]
struct Cli {
    /// SMILES or SD file to read.
    #[arg(value_name = "FILE")]
    input: PathBuf,
    /// Report file to write, one fingerprint per line.
    #[arg(short, long, value_name = "FILE", default_value = "fingerprints.txt")]
    output: PathBuf,
    /// TOML settings file. Command line flags take precedence.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Standard, Extended, Graph only, EState, MACCS or Substructure.
    #[arg(short, long, value_name = "KIND")]
    fingerprint: Option<String>,
    /// Field separator: space, tab or csv.
    #[arg(short, long, value_name = "SEP")]
    delimiter: Option<String>,
    /// Log every skipped molecule and per-record detail.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(kind) = cli.fingerprint.as_deref() {
        options.fingerprint = FingerprintKind::from_selector(kind);
    }
    if let Some(delimiter) = cli.delimiter.as_deref() {
        options.delimiter = Delimiter::from_selector(delimiter);
    }
    options.debug |= cli.debug;
    init_logging(options.log_level());

    let runner = BatchRunner::new(&cli.input, &cli.output, options)
        .with_context(|| format!("Failed to prepare {}", cli.input.display()))?;
    info!(
        "Fingerprinting {} ({}) into {}",
        cli.input.display(),
        runner.format(),
        cli.output.display()
    );

    let handle = runner.spawn();
    let mut reported = 0;
    loop {
        let progress = handle.progress();
        if progress.status.is_finished() || handle.is_finished() {
            break;
        }
        if progress.current != reported {
            reported = progress.current;
            match progress.total {
                Some(total) => info!("{}/{} molecules", progress.current, total),
                None => info!("{} molecules", progress.current),
            }
        }
        sleep(POLL_INTERVAL);
    }

    let summary = handle.join()?;
    for exception in &summary.exceptions {
        println!("{}\t{}\t{}", exception.index, exception.context, exception.reason);
    }
    info!(
        "Wrote {} of {} molecules to {} ({} skipped)",
        summary.written,
        summary.visited,
        cli.output.display(),
        summary.exceptions.len()
    );
    if summary.status == RunStatus::Canceled {
        warn!("Run was canceled before the end of the input");
    }
    Ok(())
}
