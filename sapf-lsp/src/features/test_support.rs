use crate::repl::{Repl, ReplError, ReplLauncher};
use sapf_config::ReplConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower_lsp::async_trait;

pub(crate) use sapf_parser::sapf::testing::{sample_index, SAMPLE_SOURCE};

pub(crate) fn repl_config() -> ReplConfig {
    ReplConfig {
        binary: "sapf".into(),
        args: Vec::new(),
        help_command: "helpall".into(),
        generate_timeout_secs: 5,
    }
}

/// Hands out in-memory REPLs that record what they are sent.
#[derive(Default)]
pub(crate) struct RecordingLauncher {
    launches: AtomicUsize,
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingLauncher {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplLauncher for RecordingLauncher {
    async fn launch(&self, config: &ReplConfig) -> Result<Box<dyn Repl>, ReplError> {
        if self.fail {
            return Err(ReplError::NotFound {
                binary: config.binary.clone(),
            });
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingRepl {
            running: true,
            sent: self.sent.clone(),
        }))
    }
}

struct RecordingRepl {
    running: bool,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Repl for RecordingRepl {
    async fn send(&mut self, text: &str) -> Result<(), ReplError> {
        if !self.running {
            return Err(ReplError::NotRunning);
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.running
    }

    async fn shutdown(&mut self) {
        self.running = false;
    }
}
