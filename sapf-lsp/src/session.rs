//! Session state owned by the language server
//!
//!     A [`Session`] holds the two things that outlive a single request: the REPL handle and
//!     the active [`KeywordIndex`]. The server creates one session at startup and shuts it
//!     down on the LSP `shutdown` request.
//!
//!     The index is replaced, never edited. Regeneration and loading build the complete new
//!     index first and then swap the `Arc` under a short write lock, so readers see either
//!     the old index or the new one.

use crate::repl::{Repl, ReplError, ReplLauncher};
use sapf_config::ReplConfig;
use sapf_parser::sapf::KeywordIndex;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// The active keyword index
#[derive(Debug, Default)]
pub struct CatalogStore {
    active: RwLock<Arc<KeywordIndex>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Arc<KeywordIndex> {
        self.active.read().await.clone()
    }

    /// Swap in `index`, returning the one it replaced.
    pub async fn replace(&self, index: KeywordIndex) -> Arc<KeywordIndex> {
        let next = Arc::new(index);
        std::mem::replace(&mut *self.active.write().await, next)
    }

    pub async fn clear(&self) -> Arc<KeywordIndex> {
        self.replace(KeywordIndex::default()).await
    }
}

pub struct Session {
    launcher: Arc<dyn ReplLauncher>,
    repl: Mutex<Option<Box<dyn Repl>>>,
    catalog: CatalogStore,
}

impl Session {
    pub fn new(launcher: Arc<dyn ReplLauncher>) -> Self {
        Self {
            launcher,
            repl: Mutex::new(None),
            catalog: CatalogStore::new(),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Start the REPL unless one is running. Returns true when a new process was started.
    pub async fn start_repl(&self, config: &ReplConfig) -> Result<bool, ReplError> {
        let mut slot = self.repl.lock().await;
        if let Some(repl) = slot.as_mut() {
            if repl.is_running() {
                return Ok(false);
            }
        }
        *slot = Some(self.launcher.launch(config).await?);
        Ok(true)
    }

    pub async fn is_running(&self) -> bool {
        match self.repl.lock().await.as_mut() {
            Some(repl) => repl.is_running(),
            None => false,
        }
    }

    /// Send `text`, starting the REPL first when needed.
    pub async fn send(&self, config: &ReplConfig, text: &str) -> Result<(), ReplError> {
        let mut slot = self.repl.lock().await;
        let running = match slot.as_mut() {
            Some(repl) => repl.is_running(),
            None => false,
        };
        if !running {
            *slot = Some(self.launcher.launch(config).await?);
        }
        match slot.as_mut() {
            Some(repl) => repl.send(text).await,
            None => Err(ReplError::NotRunning),
        }
    }

    /// Send `text` only to an already running REPL. Returns false when none is running.
    pub async fn send_if_running(&self, text: &str) -> Result<bool, ReplError> {
        let mut slot = self.repl.lock().await;
        match slot.as_mut() {
            Some(repl) => {
                if !repl.is_running() {
                    return Ok(false);
                }
                repl.send(text).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dispose of the REPL. Returns false when there was none.
    pub async fn stop_repl(&self) -> bool {
        match self.repl.lock().await.take() {
            Some(mut repl) => {
                repl.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub async fn shutdown(&self) {
        self.stop_repl().await;
        self.catalog.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{repl_config, RecordingLauncher};
    use sapf_parser::sapf::testing::sample_index;

    #[tokio::test]
    async fn replace_swaps_the_whole_index() {
        let store = CatalogStore::new();
        let before = store.current().await;
        assert!(before.is_empty());

        let previous = store.replace(sample_index()).await;
        assert!(previous.is_empty());
        assert!(store.current().await.get("dup").is_some());
        // Holders of the old Arc keep their snapshot.
        assert!(before.get("dup").is_none());

        store.clear().await;
        assert!(store.current().await.is_empty());
    }

    #[tokio::test]
    async fn send_starts_the_repl_once() {
        let launcher = Arc::new(RecordingLauncher::default());
        let session = Session::new(launcher.clone());
        let config = repl_config();

        session.send(&config, "1 2 +").await.unwrap();
        session.send(&config, "3 *").await.unwrap();
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.sent(), ["1 2 +", "3 *"]);
        assert!(!session.start_repl(&config).await.unwrap());
    }

    #[tokio::test]
    async fn stop_disposes_and_a_later_send_restarts() {
        let launcher = Arc::new(RecordingLauncher::default());
        let session = Session::new(launcher.clone());
        let config = repl_config();

        assert!(!session.stop_repl().await);
        assert!(session.start_repl(&config).await.unwrap());
        assert!(session.is_running().await);
        assert!(session.stop_repl().await);
        assert!(!session.is_running().await);
        assert!(!session.send_if_running("stop").await.unwrap());

        session.send(&config, "stop").await.unwrap();
        assert_eq!(launcher.launches(), 2);
    }

    #[tokio::test]
    async fn send_if_running_never_launches() {
        let launcher = Arc::new(RecordingLauncher::default());
        let session = Session::new(launcher.clone());

        assert!(!session.send_if_running("stop").await.unwrap());
        assert_eq!(launcher.launches(), 0);

        session.start_repl(&repl_config()).await.unwrap();
        assert!(session.send_if_running("stop").await.unwrap());
        assert_eq!(launcher.sent(), ["stop"]);
        assert_eq!(launcher.launches(), 1);
    }

    #[tokio::test]
    async fn launch_failures_propagate() {
        let launcher = Arc::new(RecordingLauncher::failing());
        let session = Session::new(launcher);
        let err = session.send(&repl_config(), "1").await.unwrap_err();
        assert!(matches!(err, ReplError::NotFound { .. }));
        assert!(!session.is_running().await);
    }
}
