//! specgram CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};
use miette::{Diagnostic, GraphicalReportHandler};

use specgram_cli::{
    Args,
    error_adapter::{Reportable, aborted_report, report_reportables, to_reportables},
};

/// Render each reportable through miette, logging it at its own severity.
fn render_all(reporter: &GraphicalReportHandler, reportables: &[Reportable<'_>]) {
    for reportable in reportables {
        let mut writer = String::new();
        reporter
            .render_report(&mut writer, reportable)
            .expect("Writing to String buffer is infallible");

        match reportable.severity() {
            Some(miette::Severity::Warning) | Some(miette::Severity::Advice) => warn!("{writer}"),
            _ => error!("{writer}"),
        }
    }
}

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting specgram");
    debug!(args:?; "Parsed arguments");

    let reporter = GraphicalReportHandler::new();

    let report = match specgram_cli::run(&args) {
        Ok(report) => report,
        Err(err) => {
            render_all(&reporter, &to_reportables(&err));
            if let Some(report) = aborted_report(&err) {
                print!("{report}");
            }
            process::exit(1);
        }
    };

    render_all(&reporter, &report_reportables(&report));
    print!("{report}");

    if args.check && report.is_stale() {
        eprintln!("{}: managed regions are out of date", args.input);
        process::exit(1);
    }

    info!("Completed successfully");
    process::exit(report.exit_code());
}
