//! Squish - compress an image to a target file size.
//!
//! This binary reads a JPEG or PNG, runs the size-targeting search and
//! writes the result.

mod config;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squish_core::{compress_upload, format_size, Fit};

use crate::config::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let bytes = fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    info!(
        "Compressing {} ({}) to {} KB",
        cli.input.display(),
        format_size(bytes.len() as u64),
        cli.target_kb
    );

    let compressed = compress_upload(&bytes, cli.target_kb, cli.allow_downscale, &cli.search_config())
        .context("Compression failed")?;

    if compressed.fit() == Fit::ClosestOver {
        warn!(
            "Could not reach {} KB; writing the smallest result found",
            cli.target_kb
        );
        if !cli.allow_downscale {
            warn!("  Try --allow-downscale to reduce resolution as well");
        }
    }

    let output = cli.output_path();
    fs::write(&output, compressed.payload())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Original size:   {}", format_size(compressed.original_size()));
    info!(
        "Compressed size: {} ({}% smaller)",
        format_size(compressed.byte_size()),
        compressed.reduction_percent()
    );
    info!(
        "Quality {:.3}, scale {:.2} ({}x{}), {} encodes",
        compressed.quality(),
        compressed.scale(),
        compressed.width(),
        compressed.height(),
        compressed.oracle_calls()
    );
    info!("Saved to {}", output.display());

    Ok(())
}

/// Initialize the logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "squish=debug,squish_core=debug"
    } else {
        "squish=info,squish_core=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
