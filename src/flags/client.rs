//! The process-wide flag client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::RecommendedWatcher;
use reqwest::header::HeaderValue;
use tokio::sync::broadcast;

use crate::config::{FlagSourceConfig, FlagsConfig};
use crate::flags::api::FlagEvaluator;
use crate::flags::context::EvaluationContext;
use crate::flags::error::FlagClientError;
use crate::flags::file::{load_flag_file, FlagFileWatcher};
use crate::flags::logging::LogSink;
use crate::flags::model::{EvaluationDetail, FlagSnapshot};
use crate::flags::polling::{PollOutcome, PollingSource};
use crate::flags::store::FlagStore;
use crate::observability::metrics;

/// Flag client bound to one flag source.
///
/// Built once at startup and shared read-only by all requests. Background
/// synchronization (polling or file watching) only ever swaps the store's
/// snapshot.
pub struct FlagClient {
    store: Arc<FlagStore>,
    sink: Arc<dyn LogSink>,
    _watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FlagClient {
    /// Validate the key, load initial flag data and start synchronization.
    ///
    /// A rejected, empty or unsendable key, a bad backend URI or an unreadable flag file
    /// is an error. An unreachable backend is not: the client starts
    /// uninitialized, serves defaults and keeps polling.
    pub async fn start(
        settings: &FlagsConfig,
        sink: Arc<dyn LogSink>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Arc<Self>, FlagClientError> {
        if settings.sdk_key.trim().is_empty() {
            return Err(FlagClientError::EmptySdkKey);
        }
        if HeaderValue::from_str(&settings.sdk_key).is_err() {
            return Err(FlagClientError::MalformedSdkKey);
        }

        let store = Arc::new(FlagStore::new());
        let mut watcher = None;

        match &settings.source {
            FlagSourceConfig::Offline { values } => {
                store.replace(FlagSnapshot::from_values(values.clone()));
                sink.info(&format!(
                    "offline mode: serving {} flags from configuration",
                    values.len()
                ));
            }
            FlagSourceConfig::File { path, watch } => {
                let snapshot = load_flag_file(path)?;
                sink.info(&format!(
                    "loaded {} flags from {}",
                    snapshot.len(),
                    path.display()
                ));
                store.replace(snapshot);
                if *watch {
                    watcher = Some(FlagFileWatcher::new(path, store.clone(), sink.clone()).run()?);
                }
            }
            FlagSourceConfig::Polling {
                base_uri,
                poll_interval_secs,
                timeout_secs,
            } => {
                let mut poller = PollingSource::new(
                    base_uri,
                    &settings.sdk_key,
                    Duration::from_secs(*poll_interval_secs),
                    Duration::from_secs(*timeout_secs),
                )?;

                let wait = Duration::from_secs(settings.start_wait_secs);
                let initial = tokio::time::timeout(wait, poller.fetch()).await;
                match initial {
                    Ok(Ok(PollOutcome::Updated(snapshot))) => {
                        sink.info(&format!(
                            "received {} flags from {}",
                            snapshot.len(),
                            poller.endpoint()
                        ));
                        store.replace(snapshot);
                    }
                    Ok(Ok(PollOutcome::NotModified)) => {}
                    Ok(Err(e)) if e.is_fatal() => return Err(e),
                    Ok(Err(e)) => sink.warn(&format!(
                        "initial flag fetch failed, serving defaults until flags arrive: {}",
                        e
                    )),
                    Err(_) => sink.warn(&format!(
                        "no flag data within {:?}, serving defaults until flags arrive",
                        wait
                    )),
                }

                tokio::spawn(poller.run(store.clone(), sink.clone(), shutdown));
            }
        }

        Ok(Arc::new(Self {
            store,
            sink,
            _watcher: Mutex::new(watcher),
        }))
    }

    /// Client over a fixed snapshot, with no background synchronization.
    pub fn from_snapshot(snapshot: FlagSnapshot, sink: Arc<dyn LogSink>) -> Self {
        Self {
            store: Arc::new(FlagStore::with_snapshot(snapshot)),
            sink,
            _watcher: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<FlagStore> {
        &self.store
    }
}

impl FlagEvaluator for FlagClient {
    fn bool_variation_detail(
        &self,
        key: &str,
        context: &EvaluationContext,
        default: bool,
    ) -> EvaluationDetail {
        let detail = self.store.evaluate(key, context, default);
        if detail.reason.is_error() {
            self.sink.debug(&format!(
                "flag {:?} evaluated to default: {}",
                key, detail.reason
            ));
        }
        metrics::record_evaluation(&detail);
        detail
    }

    fn initialized(&self) -> bool {
        self.store.initialized()
    }
}
