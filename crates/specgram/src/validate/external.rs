//! External validator process.
//!
//! Runs a user-configured command (typically the Mermaid CLI) against the
//! markup in a temporary file and reports whether it accepted it.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use log::{debug, warn};
use thiserror::Error;

use crate::config::ValidationConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// The validator could not produce a verdict.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("failed to prepare temporary files: {0}")]
    TempFile(#[source] io::Error),

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// What the validator said about the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalOutcome {
    Accepted,
    Rejected { status: String, stderr: String },
}

/// A configured external validator command.
#[derive(Debug, Clone)]
pub struct ExternalValidator {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalValidator {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    /// Returns `None` when no command is configured.
    pub fn from_config(config: &ValidationConfig) -> Option<Self> {
        config
            .command()
            .map(|command| Self::new(command, config.args().to_vec(), config.timeout()))
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the validator on `markup`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExternalError`] if the command cannot be started, does
    /// not finish within the timeout, or temporary files cannot be created.
    /// A non-zero exit is not an error; it is reported as
    /// [`ExternalOutcome::Rejected`].
    pub fn run(&self, markup: &str) -> Result<ExternalOutcome, ExternalError> {
        let mut input = tempfile::Builder::new()
            .prefix("specgram-")
            .suffix(".mmd")
            .tempfile()
            .map_err(ExternalError::TempFile)?;
        input
            .write_all(markup.as_bytes())
            .and_then(|()| input.flush())
            .map_err(ExternalError::TempFile)?;
        let output = tempfile::Builder::new()
            .prefix("specgram-")
            .suffix(".svg")
            .tempfile()
            .map_err(ExternalError::TempFile)?;
        let mut stderr_file = tempfile::tempfile().map_err(ExternalError::TempFile)?;
        let stderr_handle = stderr_file.try_clone().map_err(ExternalError::TempFile)?;

        let input_path = input.path().to_string_lossy().to_string();
        let output_path = output.path().to_string_lossy().to_string();
        let uses_input = self.args.iter().any(|arg| arg.contains(INPUT_PLACEHOLDER));
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input_path)
                    .replace(OUTPUT_PLACEHOLDER, &output_path)
            })
            .collect();

        let stdin = if uses_input {
            Stdio::null()
        } else {
            Stdio::from(File::open(input.path()).map_err(ExternalError::TempFile)?)
        };

        debug!(command = self.command.as_str(), args:? = args; "Starting external validator");
        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_handle))
            .spawn()
            .map_err(|source| ExternalError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let status = self.wait(&mut child)?;
        if status.success() {
            debug!(command = self.command.as_str(); "External validator accepted markup");
            return Ok(ExternalOutcome::Accepted);
        }

        Ok(ExternalOutcome::Rejected {
            status: status.to_string(),
            stderr: self.captured_stderr(&mut stderr_file),
        })
    }

    /// Text the command wrote to `file`; empty if it cannot be read back.
    fn captured_stderr(&self, file: &mut File) -> String {
        let mut stderr = String::new();
        let read = file
            .seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut stderr));
        if let Err(err) = read {
            debug!(
                command = self.command.as_str(),
                err:% = err;
                "Could not read validator stderr"
            );
            stderr.clear();
        }
        stderr.trim().to_string()
    }

    fn wait(&self, child: &mut std::process::Child) -> Result<ExitStatus, ExternalError> {
        let started = Instant::now();
        loop {
            let polled = child.try_wait().map_err(|source| ExternalError::Wait {
                command: self.command.clone(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }
            if started.elapsed() >= self.timeout {
                warn!(command = self.command.as_str(); "External validator timed out, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExternalError::Timeout {
                    command: self.command.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, timeout_ms: u64) -> ExternalValidator {
        ExternalValidator::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
            Duration::from_millis(timeout_ms),
        )
    }

    #[test]
    fn test_captured_stderr() {
        let validator = shell("true", 1000);

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"  parse error on line 2\n").unwrap();
        assert_eq!(validator.captured_stderr(&mut file), "parse error on line 2");

        let dir = tempfile::tempdir().unwrap();
        let mut write_only = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(dir.path().join("stderr.log"))
            .unwrap();
        write_only.write_all(b"unreadable").unwrap();
        assert_eq!(validator.captured_stderr(&mut write_only), "");
    }

    #[test]
    fn test_from_config_without_command() {
        assert!(ExternalValidator::from_config(&ValidationConfig::default()).is_none());
    }

    #[test]
    fn test_accepts_on_success() {
        let validator = shell("grep -q flowchart", 5000);
        assert_eq!(
            validator.run("flowchart TD\n").unwrap(),
            ExternalOutcome::Accepted
        );
    }

    #[test]
    fn test_rejects_with_stderr() {
        let validator = shell("echo 'Parse error on line 2' >&2; exit 3", 5000);
        let outcome = validator.run("flowchart TD\n").unwrap();

        match outcome {
            ExternalOutcome::Rejected { status, stderr } => {
                assert!(status.contains('3'));
                assert_eq!(stderr, "Parse error on line 2");
            }
            ExternalOutcome::Accepted => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let validator = ExternalValidator::new(
            "sh",
            vec![
                "-c".to_string(),
                "grep -q erDiagram \"$0\" && cp \"$0\" \"$1\"".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            Duration::from_secs(5),
        );
        assert_eq!(
            validator.run("erDiagram\n").unwrap(),
            ExternalOutcome::Accepted
        );
    }

    #[test]
    fn test_timeout_kills_process() {
        let validator = shell("sleep 5", 100);
        let err = validator.run("flowchart TD\n").unwrap_err();
        assert!(matches!(err, ExternalError::Timeout { .. }));
    }

    #[test]
    fn test_missing_command() {
        let validator = ExternalValidator::new(
            "specgram-no-such-validator",
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = validator.run("flowchart TD\n").unwrap_err();
        assert!(matches!(err, ExternalError::Spawn { .. }));
    }
}
