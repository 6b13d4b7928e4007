//! Hot reload of the configuration file.
//!
//! The watch sits on the directory holding the file and events are filtered
//! by file name, so a save that renames a new file over the old one is seen.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::FrontConfig;

/// Sends a validated [`FrontConfig`] each time the config file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<FrontConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<FrontConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Updates stop when the returned handle is dropped.
    ///
    /// Invalid files are logged and skipped; the receiver only ever sees
    /// configs that passed validation.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path);
        let file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| OsString::from(""));

        let path = self.path.clone();
        let tx = self.update_tx;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if concerns_file(&event, &file_name) => reload(&path, &tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Directory to watch for `path`; a bare file name lives in the working directory.
fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` created or changed the file named `file_name`.
///
/// Renames count as modifications, so a rename onto the file matches too.
fn concerns_file(event: &Event, file_name: &OsStr) -> bool {
    (event.kind.is_create() || event.kind.is_modify())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<FrontConfig>) {
    // A rename-away also reports the old name; nothing to load then.
    if !path.exists() {
        return;
    }

    tracing::info!(path = ?path, "Config file change detected, reloading");
    match load_config(path) {
        Ok(config) => {
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Rejected config reload, keeping current configuration");
        }
    }
}
