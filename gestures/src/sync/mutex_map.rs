// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{borrow::Borrow, collections::HashMap, hash::Hash, sync::Arc};

use tokio::sync::Mutex;

use crate::MutexCell;

/// A concurrent map from key to one [`MutexCell`] per key, with two-level
/// locking.
///
/// The outer lock guards only the key set itself: its critical sections are
/// O(1) map operations (lookup, insert-if-absent), so it never becomes a
/// bottleneck no matter how long the per-key critical sections run. Once a
/// caller holds the returned [`Arc<MutexCell<V>>`], all further work happens
/// under that cell's own lock - updates to two different keys never contend,
/// while operations on the same key are serialized by its cell.
///
/// A cell lock must never be held while re-entering this map's outer lock;
/// every use in this crate acquires outer-then-cell, so the two levels cannot
/// deadlock.
///
/// Cloning the map is cheap and produces a handle onto the same keys and
/// cells.
#[derive(Debug)]
pub struct MutexMap<K, V> {
    cells_by_key: Arc<Mutex<HashMap<K, Arc<MutexCell<V>>>>>,
}

/// Manual impl, so that `K` and `V` do not need to be [`Clone`] themselves.
impl<K, V> Clone for MutexMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            cells_by_key: self.cells_by_key.clone(),
        }
    }
}

impl<K: Eq + Hash, V> Default for MutexMap<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K: Eq + Hash, V> MutexMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells_by_key: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cell for `key`, constructing it from `make_default` first if
    /// the key is absent. The presence check and the insert happen in one
    /// outer-lock critical section, so concurrent callers with the same key
    /// all receive the same single cell and `make_default` runs at most once
    /// per key.
    pub async fn get_or_create(
        &self,
        key: K,
        make_default: impl FnOnce() -> V,
    ) -> Arc<MutexCell<V>> {
        let mut cells_by_key = self.cells_by_key.lock().await;
        cells_by_key
            .entry(key)
            .or_insert_with(|| Arc::new(MutexCell::new(make_default())))
            .clone()
    }

    /// Return the cell for `key`, or [`None`] if the key was never created.
    pub async fn get<Q>(&self, key: &Q) -> Option<Arc<MutexCell<V>>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.cells_by_key.lock().await.get(key).cloned()
    }
}
