//! A strict run that aborts still reports its warnings and its summary.

#![cfg(unix)]

use std::fs;

use miette::Diagnostic;
use tempfile::tempdir;

use specgram::SpecgramError;
use specgram_cli::{
    Args,
    error_adapter::{aborted_report, to_reportables},
    run,
};

const SPEC: &str = "\
# Feature Specification: Notes

## User Scenarios & Testing

### User Story 1 - Write a note (Priority: P1)

1. **Given** an empty notebook, **When** the user writes a note, **Then** the note is saved

### User Story 2 - Export notes

## Requirements
";

#[test]
fn test_strict_abort_surfaces_warnings_and_summary() {
    let dir = tempdir().expect("Failed to create temp directory");
    let input = dir.path().join("spec.md");
    let config = dir.path().join("config.toml");
    fs::write(&input, SPEC).expect("write spec");
    // A validator that rejects every diagram.
    fs::write(&config, "[validation]\ncommand = \"false\"\n").expect("write config");

    let args = Args {
        input: input.to_string_lossy().to_string(),
        kind: None,
        strict: true,
        dry_run: false,
        check: false,
        output: None,
        config: Some(config.to_string_lossy().to_string()),
        log_level: "off".to_string(),
    };

    let err = run(&args).expect_err("Strict run should abort");
    assert!(matches!(err, SpecgramError::StrictValidation(_)));
    assert_eq!(fs::read_to_string(&input).expect("read spec"), SPEC);

    let reportables = to_reportables(&err);
    let warnings: Vec<String> = reportables
        .iter()
        .filter(|r| r.severity() == Some(miette::Severity::Warning))
        .map(|r| r.to_string())
        .collect();
    assert_eq!(warnings, vec!["malformed user story header".to_string()]);
    assert!(
        reportables
            .iter()
            .any(|r| r.to_string().starts_with("journey diagram: "))
    );
    assert!(
        reportables
            .last()
            .is_some_and(|r| r.to_string().starts_with("strict validation failed"))
    );

    let summary = aborted_report(&err)
        .expect("Aborted runs carry their report")
        .to_string();
    assert!(summary.starts_with("run aborted\n"));
    assert!(summary.contains("  journey: 3 nodes, 1 error(s)\n"));
    assert!(summary.contains("  aborted: journey failed validation\n"));
    assert!(summary.contains("  1 warning(s)\n"));
}

#[test]
fn test_other_errors_carry_no_report() {
    let err = SpecgramError::Config("bad".to_string());
    assert!(aborted_report(&err).is_none());
}
