//! Hot reload of the settings file
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by renaming a temp file over the original keep triggering
//! reloads. Bursts of file events collapse into a single reload.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::InputConfig;

/// Quiet period after the last file event before the file is read
const SETTLE: Duration = Duration::from_millis(100);

/// Delivers the settings file's contents each time it changes on disk
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<InputConfig>,
}

impl ConfigWatcher {
    /// Load `config_path` (creating it with defaults if missing) and start watching it
    pub async fn new(config_path: PathBuf) -> Result<(Self, InputConfig)> {
        let initial_config = InputConfig::load_or_create(&config_path)
            .await
            .context("Failed to load initial config")?;

        let file_name = config_path
            .file_name()
            .map(OsString::from)
            .with_context(|| format!("Config path has no file name: {}", config_path.display()))?;
        let watch_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // notify calls back on its own thread; try_send needs no runtime
        let (touch_tx, touch_rx) = mpsc::channel::<()>(1);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches_file(&event, &file_name) => {
                trace!("Config file event: {:?}", event.kind);
                // A full channel already has a reload pending
                let _ = touch_tx.try_send(());
            },
            Ok(_) => {},
            Err(e) => error!("Config watch error: {}", e),
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", watch_dir.display()))?;

        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(reload_loop(config_path.clone(), touch_rx, tx));

        info!("Watching {} for changes", config_path.display());

        Ok((Self { _watcher: watcher, rx }, initial_config))
    }

    /// Next successfully parsed version of the file
    ///
    /// Returns `None` once the watcher has shut down.
    pub async fn next_config(&mut self) -> Option<InputConfig> {
        self.rx.recv().await
    }
}

fn touches_file(event: &Event, file_name: &OsStr) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name))
}

async fn reload_loop(path: PathBuf, mut touches: mpsc::Receiver<()>, tx: mpsc::Sender<InputConfig>) {
    while touches.recv().await.is_some() {
        loop {
            match tokio::time::timeout(SETTLE, touches.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        match InputConfig::load(&path).await {
            Ok(config) => {
                debug!("Reloaded {}", path.display());
                if tx.send(config).await.is_err() {
                    return;
                }
            },
            Err(e) => warn!("Failed to reload config (keeping old config): {:#}", e),
        }
    }
}
