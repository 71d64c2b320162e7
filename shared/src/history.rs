//! Historical stock observations
//!
//! Observations are kept in a [`CappedLog`]: a bounded sequence that evicts
//! the oldest entries first once the capacity is reached. The store is shared
//! by every upload, so the cap applies across all products.

use std::collections::VecDeque;
use std::sync::RwLock;

use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::models::HistoricalObservation;

/// Maximum number of observations retained across all products
pub const HISTORY_CAPACITY: usize = 100;

/// Bounded, oldest-first-evicting sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedLog<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> CappedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Build from existing entries, keeping only the newest `capacity`
    pub fn from_entries(capacity: usize, entries: impl IntoIterator<Item = T>) -> Self {
        let mut log = Self::new(capacity);
        for entry in entries {
            log.push(entry);
        }
        log
    }

    /// Append an entry; returns how many old entries were evicted
    pub fn push(&mut self, entry: T) -> usize {
        if self.capacity == 0 {
            return 1;
        }
        self.entries.push_back(entry);
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

impl<T: Clone> CappedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

/// Persistence seam for observations
pub trait HistoryStore: Send + Sync {
    /// All retained observations, oldest first; unreadable storage reads as empty
    fn snapshot(&self) -> HistorySnapshot;

    /// Append one observation, trimming to the retention cap
    fn append(&self, observation: HistoricalObservation) -> Result<(), StoreError>;

    /// Append a batch in order; stores backed by files override this to write once
    fn append_all(&self, observations: Vec<HistoricalObservation>) -> Result<(), StoreError> {
        for observation in observations {
            self.append(observation)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError>;

    fn len(&self) -> usize {
        self.snapshot().len()
    }
}

/// Immutable view of the store taken before a batch starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    observations: Vec<HistoricalObservation>,
}

impl HistorySnapshot {
    pub fn new(observations: Vec<HistoricalObservation>) -> Self {
        Self { observations }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Stock values recorded for one product, oldest first
    pub fn stocks_for(&self, product_id: &str) -> Vec<Decimal> {
        self.observations
            .iter()
            .filter(|obs| obs.product_id == product_id)
            .map(|obs| obs.current_stock)
            .collect()
    }

    pub fn observations(&self) -> &[HistoricalObservation] {
        &self.observations
    }
}

/// In-process store, used by tests and when no data directory is configured
pub struct MemoryHistoryStore {
    log: RwLock<CappedLog<HistoricalObservation>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            log: RwLock::new(CappedLog::new(capacity)),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn snapshot(&self) -> HistorySnapshot {
        match self.log.read() {
            Ok(log) => HistorySnapshot::new(log.to_vec()),
            Err(_) => HistorySnapshot::default(),
        }
    }

    fn append(&self, observation: HistoricalObservation) -> Result<(), StoreError> {
        let mut log = self.log.write().map_err(|_| StoreError::Poisoned)?;
        log.push(observation);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.log.write().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }
}
