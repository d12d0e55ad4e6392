//! Manifest transform CLI entry point.
//!
//! Reads a manifest stream from stdin, applies the selected transformer, and
//! writes the rewritten stream to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manifest_transform::{ImageTransformer, TransformConfig, Transformer, ValueTransformer};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "manifest-transform")]
#[command(
    author,
    version,
    about = "Rule-driven value rewriting for Kubernetes manifest streams"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite container image references to point at mirrored registries
    Image {
        /// Rule configuration file path (YAML or JSON)
        config: PathBuf,
    },
    /// Substitute $TOKEN placeholders, including inside Secret data
    Value {
        /// Rule configuration file path (YAML or JSON)
        config: PathBuf,
        /// Inline token pairs: `key:value`, or `key:` followed by the value
        pairs: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Stdout carries the rewritten stream; all diagnostics go to stderr.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let transformer: Box<dyn Transformer> = match &args.command {
        Command::Image { config } => {
            let config = TransformConfig::load(config)
                .with_context(|| format!("Failed to load config file: {}", config.display()))?;
            let transformer =
                ImageTransformer::new(&config)?.with_mutation_tracker(Box::new(|path, old, new| {
                    debug!(%path, %old, %new, "Rewrote image reference");
                }));
            Box::new(transformer)
        }
        Command::Value { config, pairs } => {
            let config = TransformConfig::load(config)
                .with_context(|| format!("Failed to load config file: {}", config.display()))?;
            Box::new(ValueTransformer::new(config.token_map(pairs)))
        }
    };

    info!(transformer = transformer.name(), "Transformer initialized");

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read manifest stream from stdin")?;

    let output = transformer
        .transform(&input)
        .with_context(|| format!("{} transform failed", transformer.name()))?;

    std::io::stdout()
        .write_all(output.as_bytes())
        .context("Failed to write manifest stream to stdout")?;

    Ok(())
}
