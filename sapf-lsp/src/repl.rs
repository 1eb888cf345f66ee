//! The sapf REPL process
//!
//!     Evaluation commands write text to a long-running `sapf` process. [`Repl`] is the seam
//!     the session talks to; [`ProcessRepl`] is the real child process and tests substitute
//!     a recording fake through [`ReplLauncher`].
//!
//!     The child's stdout and stderr are forwarded line by line to the `log` facade. The
//!     process is killed when the handle is dropped.

use sapf_config::ReplConfig;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tower_lsp::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("sapf executable '{binary}' not found; set repl.binary in sapf.toml")]
    NotFound { binary: String },
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error("the sapf REPL is not running")]
    NotRunning,
    #[error("failed to write to the sapf REPL: {0}")]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait Repl: Send + Sync {
    /// Write `text` to the REPL, followed by a newline when it lacks one.
    async fn send(&mut self, text: &str) -> Result<(), ReplError>;
    fn is_running(&mut self) -> bool;
    async fn shutdown(&mut self);
}

/// Starts REPL processes for a session.
#[async_trait]
pub trait ReplLauncher: Send + Sync + 'static {
    async fn launch(&self, config: &ReplConfig) -> Result<Box<dyn Repl>, ReplError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl ReplLauncher for ProcessLauncher {
    async fn launch(&self, config: &ReplConfig) -> Result<Box<dyn Repl>, ReplError> {
        Ok(Box::new(ProcessRepl::spawn(config)?))
    }
}

#[derive(Debug)]
pub struct ProcessRepl {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ProcessRepl {
    pub fn spawn(config: &ReplConfig) -> Result<Self, ReplError> {
        let mut child = Command::new(&config.binary)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| spawn_error(&config.binary, source))?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, log::Level::Info));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, log::Level::Warn));
        }
        log::info!("started sapf REPL '{}' (pid {:?})", config.binary, child.id());

        let stdin = child.stdin.take();
        Ok(Self { child, stdin })
    }
}

#[async_trait]
impl Repl for ProcessRepl {
    async fn send(&mut self, text: &str) -> Result<(), ReplError> {
        if !self.is_running() {
            return Err(ReplError::NotRunning);
        }
        let stdin = self.stdin.as_mut().ok_or(ReplError::NotRunning)?;
        stdin.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            stdin.write_all(b"\n").await?;
        }
        stdin.flush().await?;
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn shutdown(&mut self) {
        // Closing stdin lets the REPL exit on its own; kill whatever is left.
        self.stdin.take();
        if let Err(err) = self.child.kill().await {
            log::debug!("sapf REPL already gone: {err}");
        }
        log::info!("stopped sapf REPL");
    }
}

pub(crate) fn spawn_error(binary: &str, source: io::Error) -> ReplError {
    if source.kind() == io::ErrorKind::NotFound {
        ReplError::NotFound {
            binary: binary.to_string(),
        }
    } else {
        ReplError::Spawn {
            binary: binary.to_string(),
            source,
        }
    }
}

async fn forward_lines<R>(stream: R, level: log::Level)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => log::log!(level, "sapf: {line}"),
            Ok(None) => break,
            Err(err) => {
                log::debug!("stopped reading sapf output: {err}");
                break;
            }
        }
    }
}
