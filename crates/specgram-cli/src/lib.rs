//! CLI logic for the specgram diagram tool.
//!
//! This module wires parsed arguments and the configuration file into a
//! [`DiagramEngine`] run.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::path::PathBuf;

use log::info;

use specgram::{DiagramEngine, RunOptions, RunReport, SpecgramError};

/// Run the specgram CLI application
///
/// Loads configuration, then synthesizes, validates, and rewrites the
/// diagrams of the input document. `--check` implies a dry run.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `SpecgramError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed managed regions
/// - Strict validation failures
pub fn run(args: &Args) -> Result<RunReport, SpecgramError> {
    info!(
        input_path = args.input,
        strict = args.strict,
        check = args.check;
        "Processing document"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let options = RunOptions::new(&args.input)
        .with_kind(args.kind)
        .with_strict(args.strict)
        .with_dry_run(args.dry_run || args.check)
        .with_output(args.output.as_ref().map(PathBuf::from));

    DiagramEngine::new(app_config).run(&options)
}
