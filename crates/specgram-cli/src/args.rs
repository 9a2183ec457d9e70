//! Command-line argument definitions for the specgram CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the document and diagram kinds, the run
//! mode, configuration file selection, and logging verbosity.

use clap::Parser;

use specgram::diagram::DiagramKind;

/// Command-line arguments for the specgram diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the specification document
    #[arg(help = "Path to the Markdown specification document")]
    pub input: String,

    /// Only regenerate this diagram kind (journey, entity-relationship)
    #[arg(short, long, value_parser = parse_kind)]
    pub kind: Option<DiagramKind>,

    /// Run the external validator and abort on any validation error
    #[arg(long)]
    pub strict: bool,

    /// Generate and validate without writing the document
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with a non-zero status if any managed region is out of date;
    /// implies --dry-run
    #[arg(long)]
    pub check: bool,

    /// Write the updated document here instead of over the input
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_kind(value: &str) -> Result<DiagramKind, String> {
    value.parse().map_err(|err: &str| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["specgram", "spec.md"]);

        assert_eq!(args.input, "spec.md");
        assert_eq!(args.kind, None);
        assert!(!args.strict && !args.dry_run && !args.check);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_kind_flag() {
        let args = Args::parse_from(["specgram", "spec.md", "--kind", "er", "--check"]);

        assert_eq!(args.kind, Some(DiagramKind::EntityRelationship));
        assert!(args.check);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Args::try_parse_from(["specgram", "spec.md", "--kind", "sequence"]).is_err());
    }
}
