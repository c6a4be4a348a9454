//! HEKA Command Line Interface
//!
//! Inspects PatchMaster bundle files and previews their conversion.
//!
//! # Commands
//!
//! - `heka summary` - Header, catalog and pulse tree counts
//! - `heka dump` - Full metadata report
//! - `heka convert` - Validate and map a bundle onto normalized series

mod convert;
mod output;
mod summary;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use heka_reader::bundle::dump::write_report;
use heka_reader::Bundle;
use tracing_subscriber::{fmt, EnvFilter};

use output::OutputFormat;

/// heka - PatchMaster bundle tools
#[derive(Parser)]
#[command(name = "heka")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the bundle header, catalog and recording counts
    ///
    /// Examples:
    ///   heka summary recording.dat
    ///   heka summary recording.dat --format json
    Summary {
        /// Path to the PatchMaster .dat bundle
        bundle: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print every record of every tree sub-stream
    Dump {
        /// Path to the PatchMaster .dat bundle
        bundle: PathBuf,
    },

    /// Validate a bundle and preview the series it converts to
    Convert(convert::ConvertArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Summary { bundle, format } => {
            let opened = open(&bundle)?;
            let summary = summary::BundleSummary::collect(&opened)?;
            println!("{}", output::format_summary(&summary, format));
            Ok(())
        }
        Commands::Dump { bundle } => {
            let opened = open(&bundle)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&opened, &mut out)
                .with_context(|| format!("failed to dump {}", bundle.display()))?;
            out.flush()?;
            Ok(())
        }
        Commands::Convert(args) => convert::run(&args),
    }
}

/// Open a bundle, naming the path on failure.
fn open(path: &Path) -> anyhow::Result<Bundle> {
    Bundle::open(path).with_context(|| format!("failed to open bundle {}", path.display()))
}
