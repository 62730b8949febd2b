//! Stateful accessor bound to one resource: local collection, loading flag,
//! CRUD operations and user feedback.
//!
//! `list` swallows failures (notification + log) and keeps the previous
//! collection. `create`, `update` and `remove` notify and also return the
//! error so the caller can react, e.g. keep a form open.
//!
//! Overlapping `list` calls are not sequenced: whichever response resolves
//! last overwrites the collection, regardless of request order. The hook only
//! logs a warning when that happens.

use super::{Resource, ResourceStore};
use crate::error::AppError;
use crate::notify::NotificationSink;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

struct HookState<T> {
    records: Vec<T>,
    loading: bool,
}

pub struct ResourceHook<R: Resource> {
    store: ResourceStore<R>,
    sink: Arc<dyn NotificationSink>,
    state: Arc<RwLock<HookState<R::Record>>>,
    lists_in_flight: Arc<AtomicUsize>,
}

impl<R: Resource> Clone for ResourceHook<R> {
    fn clone(&self) -> Self {
        ResourceHook {
            store: self.store.clone(),
            sink: self.sink.clone(),
            state: self.state.clone(),
            lists_in_flight: self.lists_in_flight.clone(),
        }
    }
}

/// Clears the loading flag however `list` exits.
struct LoadingGuard<'a, T> {
    state: &'a RwLock<HookState<T>>,
    in_flight: &'a AtomicUsize,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        write(self.state).loading = false;
    }
}

impl<R: Resource> ResourceHook<R> {
    pub fn new(store: ResourceStore<R>, sink: Arc<dyn NotificationSink>) -> Self {
        ResourceHook {
            store,
            sink,
            state: Arc::new(RwLock::new(HookState {
                records: Vec::new(),
                loading: false,
            })),
            lists_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &ResourceStore<R> {
        &self.store
    }

    /// Snapshot of the active records as of the last successful list.
    pub fn records(&self) -> Vec<R::Record> {
        read(&self.state).records.clone()
    }

    pub fn is_loading(&self) -> bool {
        read(&self.state).loading
    }

    /// Refetch the active records. Never fails: errors become a notification and a log line,
    /// and the previous collection is kept.
    pub async fn list(&self) {
        self.lists_in_flight.fetch_add(1, Ordering::SeqCst);
        write(&self.state).loading = true;
        let _guard = LoadingGuard {
            state: &self.state,
            in_flight: &self.lists_in_flight,
        };

        match self.store.list_active().await {
            Ok(records) => {
                let overlapping = self.lists_in_flight.load(Ordering::SeqCst) > 1;
                if overlapping {
                    tracing::warn!(
                        table = %self.store.table().display_name(),
                        "list resolved while another list is in flight; last response wins"
                    );
                }
                tracing::debug!(table = %self.store.table().display_name(), count = records.len(), "list refreshed");
                write(&self.state).records = records;
            }
            Err(e) => {
                tracing::error!(table = %self.store.table().display_name(), error = %e, "list failed");
                self.sink.error(R::MESSAGES.load_failed);
            }
        }
    }

    /// Insert one record, then resync. Returns the created record.
    pub async fn create(&self, new: R::New) -> Result<R::Record, AppError> {
        match self.store.insert(&new).await {
            Ok(record) => {
                self.sink.success(R::MESSAGES.created);
                self.list().await;
                Ok(record)
            }
            Err(e) => Err(self.report(e, R::MESSAGES.create_failed)),
        }
    }

    /// Partial update by id, then resync.
    pub async fn update(&self, id: Uuid, patch: R::Patch) -> Result<(), AppError> {
        match self.store.update(id, &patch).await {
            Ok(()) => {
                self.sink.success(R::MESSAGES.updated);
                self.list().await;
                Ok(())
            }
            Err(e) => Err(self.report(e, R::MESSAGES.update_failed)),
        }
    }

    /// Soft delete by id, then resync. Repeating it is harmless.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        match self.store.deactivate(id).await {
            Ok(()) => {
                self.sink.success(R::MESSAGES.removed);
                self.list().await;
                Ok(())
            }
            Err(e) => Err(self.report(e, R::MESSAGES.remove_failed)),
        }
    }

    fn report(&self, e: AppError, fallback: &str) -> AppError {
        tracing::error!(table = %self.store.table().display_name(), error = %e, "mutation failed");
        self.sink.error(e.service_message().unwrap_or(fallback));
        e
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
