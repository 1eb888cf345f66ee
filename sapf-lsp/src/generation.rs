//! Catalog generation from a live sapf executable
//!
//!     Runs `binary args...` as a one-shot process, writes the help command to its stdin,
//!     closes stdin and collects stdout until the process exits. The whole run is bounded by
//!     the configured timeout; a process still running at the deadline is killed.
//!
//!     Any failure leaves the caller's active catalog alone: the generator only returns a
//!     new [`Catalog`] or a [`GenerateError`].

use crate::repl::{spawn_error, ReplError};
use sapf_config::ReplConfig;
use sapf_parser::sapf::catalog::{parse_help, LISTING_MARKER};
use sapf_parser::sapf::Catalog;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Longest stderr excerpt carried by [`GenerateError::Failed`]
const STDERR_EXCERPT: usize = 400;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("sapf executable '{binary}' not found; set repl.binary in sapf.toml")]
    NotFound { binary: String },
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error while capturing help text: {0}")]
    Io(#[from] io::Error),
    #[error("'{binary}' exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },
    #[error("'{binary}' did not finish within {} seconds", timeout.as_secs_f32())]
    TimedOut { binary: String, timeout: Duration },
    #[error("help output has no '{}' listing", LISTING_MARKER)]
    NoListing,
}

impl From<ReplError> for GenerateError {
    fn from(err: ReplError) -> Self {
        match err {
            ReplError::NotFound { binary } => GenerateError::NotFound { binary },
            ReplError::Spawn { binary, source } => GenerateError::Spawn { binary, source },
            ReplError::Io(source) => GenerateError::Io(source),
            ReplError::NotRunning => GenerateError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "process exited before reading the help command",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogGenerator {
    binary: String,
    args: Vec<String>,
    help_command: String,
    timeout: Duration,
}

impl CatalogGenerator {
    pub fn new(config: &ReplConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            args: config.args.clone(),
            help_command: config.help_command.clone(),
            timeout: config.generate_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the executable and return everything it printed to stdout.
    pub async fn capture(&self) -> Result<String, GenerateError> {
        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GenerateError::from(spawn_error(&self.binary, source)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut command = self.help_command.clone();
            command.push('\n');
            // A process that exits without reading stdin is judged by its exit status.
            if let Err(err) = stdin.write_all(command.as_bytes()).await {
                log::debug!("could not write help command: {err}");
            }
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(GenerateError::TimedOut {
                    binary: self.binary.clone(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerateError::Failed {
                binary: self.binary.clone(),
                status: output.status.to_string(),
                stderr: excerpt(stderr.trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Capture the help text and parse it. An empty result is an error.
    pub async fn generate(&self) -> Result<Catalog, GenerateError> {
        let raw = self.capture().await?;
        let catalog = parse_help(&raw);
        if catalog.is_empty() {
            return Err(GenerateError::NoListing);
        }
        log::info!(
            "generated catalog with {} functions in {} categories",
            catalog.len(),
            catalog.categories().len()
        );
        Ok(catalog)
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(STDERR_EXCERPT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CatalogGenerator {
        CatalogGenerator::new(&ReplConfig {
            binary: "sh".into(),
            args: vec!["-c".into(), script.into()],
            help_command: "helpall".into(),
            generate_timeout_secs: 10,
        })
    }

    #[tokio::test]
    async fn parses_the_captured_listing() {
        let generator = shell(
            "read cmd; [ \"$cmd\" = helpall ] || exit 2; \
             printf 'BUILT IN FUNCTIONS\\n*** math ***\\n add (a b --> c) adds two\\n'",
        );
        let catalog = generator.generate().await.expect("generation");
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.category("math").unwrap().entries()[0].description,
            "adds two"
        );
    }

    #[tokio::test]
    async fn output_without_listing_is_an_error() {
        let generator = shell("read cmd; echo 'unknown command'");
        assert!(matches!(
            generator.generate().await,
            Err(GenerateError::NoListing)
        ));
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let generator = shell("echo boom >&2; exit 3");
        match generator.generate().await {
            Err(GenerateError::Failed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let generator = shell("sleep 5").with_timeout(Duration::from_millis(100));
        assert!(matches!(
            generator.generate().await,
            Err(GenerateError::TimedOut { .. })
        ));
    }

    #[tokio::test]
    async fn missing_executable_is_named() {
        let generator = CatalogGenerator::new(&ReplConfig {
            binary: "sapf-binary-that-does-not-exist".into(),
            args: Vec::new(),
            help_command: "helpall".into(),
            generate_timeout_secs: 1,
        });
        assert!(matches!(
            generator.generate().await,
            Err(GenerateError::NotFound { .. })
        ));
    }

    #[test]
    fn long_stderr_is_cut() {
        let long = "x".repeat(STDERR_EXCERPT + 10);
        assert_eq!(excerpt(&long).len(), STDERR_EXCERPT + 3);
        assert_eq!(excerpt("short"), "short");
    }
}
