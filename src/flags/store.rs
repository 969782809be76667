//! Snapshot store read by every evaluation.
//!
//! Readers load the current `Arc<FlagSnapshot>` without locking; sources
//! publish a complete new snapshot with a single atomic swap, so a request
//! never observes a half-applied update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::flags::context::EvaluationContext;
use crate::flags::model::{evaluate, ErrorKind, EvaluationDetail, FlagSnapshot};

#[derive(Debug, Default)]
pub struct FlagStore {
    snapshot: ArcSwap<FlagSnapshot>,
    initialized: AtomicBool,
}

impl FlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that is ready from the start.
    pub fn with_snapshot(snapshot: FlagSnapshot) -> Self {
        let store = Self::new();
        store.replace(snapshot);
        store
    }

    /// Publish a new snapshot and mark the store initialized.
    pub fn replace(&self, snapshot: FlagSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
        self.initialized.store(true, Ordering::Release);
    }

    pub fn initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> Arc<FlagSnapshot> {
        self.snapshot.load_full()
    }

    pub fn evaluate(
        &self,
        key: &str,
        context: &EvaluationContext,
        default: bool,
    ) -> EvaluationDetail {
        if !self.initialized() {
            return EvaluationDetail::error(default, ErrorKind::ClientNotReady);
        }

        let snapshot = self.snapshot.load();
        match snapshot.get(key) {
            Some(flag) => evaluate(flag, context, default),
            None => EvaluationDetail::error(default, ErrorKind::FlagNotFound),
        }
    }
}
