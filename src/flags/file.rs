//! File data source with hot reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::flags::error::FlagClientError;
use crate::flags::logging::LogSink;
use crate::flags::model::FlagSnapshot;
use crate::flags::store::FlagStore;

/// Read and parse a JSON flag file.
pub fn load_flag_file(path: &Path) -> Result<FlagSnapshot, FlagClientError> {
    let content = fs::read_to_string(path).map_err(|source| FlagClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// A watcher that reloads the flag file into the store when it changes.
pub struct FlagFileWatcher {
    path: PathBuf,
    store: Arc<FlagStore>,
    sink: Arc<dyn LogSink>,
}

impl FlagFileWatcher {
    pub fn new(path: &Path, store: Arc<FlagStore>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
            sink,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The parent directory is watched rather than the file itself, so a file
    /// replaced by rename (editors, mounted config maps) keeps being picked up.
    /// The returned watcher must be kept alive for reloads to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        let path = self.path.clone();
        let store = self.store;
        let sink = self.sink.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if touches_file && (event.kind.is_modify() || event.kind.is_create()) {
                        match load_flag_file(&path) {
                            Ok(snapshot) => {
                                sink.info(&format!(
                                    "flag file reloaded with {} flags",
                                    snapshot.len()
                                ));
                                store.replace(snapshot);
                            }
                            Err(e) => sink.error(&format!(
                                "failed to reload flag file: {}. Keeping current flags.",
                                e
                            )),
                        }
                    }
                }
                Err(e) => sink.error(&format!("flag file watch error: {:?}", e)),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        self.sink
            .info(&format!("watching {} for changes", self.path.display()));
        Ok(watcher)
    }
}
