// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatscan — turn photographed documents into clean, print-like pages.
//
// Entry point. Initialises logging, parses the command line, loads settings,
// and runs the requested command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use flatscan_core::AppConfig;
use flatscan_core::OutputFormat;
use flatscan_core::error::Result;
use flatscan_core::human_errors::humanize_error;

use services::cleanup::{CleanRequest, clean_file};
use services::config_dir::config_path;

#[derive(Parser)]
#[command(name = "flatscan")]
#[command(about = "Remove shadows and paper texture from photographed documents")]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/flatscan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a document photo and save the result
    Clean {
        /// Photo to clean (JPEG, PNG, BMP or TIFF)
        input: PathBuf,

        /// Output file (defaults to <input>_clean.png next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Adaptive threshold neighbourhood, odd and at least 3
        #[arg(short, long)]
        block_size: Option<u32>,

        /// Bias subtracted from the local mean; larger keeps less ink
        #[arg(short, long)]
        c_value: Option<i32>,

        /// Output format: png, jpeg, bmp or tiff
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// Show the effective settings as JSON
    Config {
        /// Write the effective settings to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "flatscan failed");
            eprintln!("{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config_path);
    let config = AppConfig::load(&path)?;
    tracing::debug!(path = %path.display(), "Settings loaded");

    match cli.command {
        Commands::Clean {
            input,
            output,
            block_size,
            c_value,
            format,
        } => {
            let request = CleanRequest {
                input,
                output,
                block_size,
                c_value,
                format,
            };
            let written = clean_file(&request, &config)?;
            println!("{}", written.display());
        }
        Commands::Config { write } => {
            if write {
                config.save(&path)?;
                tracing::info!(path = %path.display(), "Settings written");
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
