mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use faststart::{config, io};
use faststart_media::{Outcome, ScanOutcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let quiet = cli.quiet || config.general.quiet;

    // Respect RUST_LOG env var if set, then the config file, then defaults
    // based on the verbose flag
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| config.logging.filter.clone())
        .unwrap_or_else(|| {
            if cli.verbose {
                "faststart=debug,faststart_media=trace".to_string()
            } else {
                "faststart=warn,faststart_media=warn".to_string()
            }
        });

    // stdout may carry the output file, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, &config, quiet) {
        Ok(()) => {
            if !quiet {
                eprintln!("Completed");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let kind = match e.downcast_ref::<faststart_media::Error>() {
                Some(err) if err.is_buffer_error() => "buffer",
                Some(_) => "container",
                None => "io",
            };
            tracing::debug!(kind, "Processing failed: {:?}", e);
            if !quiet {
                eprintln!("Failed to process file: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &config::Config, quiet: bool) -> Result<()> {
    if !quiet {
        if let Some(input) = &cli.input {
            eprintln!("Input file: {}", input.display());
        }
        if let Some(output) = &cli.output {
            eprintln!("Output file: {}", output.display());
        }
    }

    let data = io::read_input(cli.input.as_deref(), config.limits.max_input_size)?;
    tracing::debug!("Read {} bytes of input", data.len());

    if cli.check {
        return check(&data);
    }

    let relocation = faststart_media::relocate(&data)?;

    match relocation.outcome {
        Outcome::Relocated {
            moov_size,
            patched_tables,
        } => {
            tracing::info!(
                "Relocated {} byte moov atom, patched {} chunk offset tables",
                moov_size,
                patched_tables
            );
            if !quiet {
                eprintln!(
                    "Moved moov atom ({} bytes) to the front, patched {} chunk offset tables",
                    moov_size, patched_tables
                );
            }
        }
        Outcome::PassThrough(reason) => {
            tracing::info!("Input passed through unchanged: {}", reason);
            if !quiet {
                eprintln!("Input left unchanged: {}", reason);
            }
        }
    }

    io::write_output(cli.output.as_deref(), &relocation.output)
}

fn check(data: &[u8]) -> Result<()> {
    match faststart_media::scan(data)? {
        ScanOutcome::Relocatable {
            moov_offset,
            moov_size,
        } => {
            println!(
                "relocatable: moov atom ({} bytes) at offset {} is the last atom",
                moov_size, moov_offset
            );
        }
        ScanOutcome::PassThrough(reason) => {
            println!("unchanged: {}", reason);
        }
    }
    Ok(())
}
