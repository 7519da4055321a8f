//! Per-month single-writer locks for summary updates

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::MonthKey;

/// Serializes the list-sum-write sequence for each month
///
/// Only coordinates writers in this process. Other processes sharing the
/// same store still race.
#[derive(Debug, Default)]
pub struct SummaryLocks {
    months: Mutex<HashMap<MonthKey, Arc<Mutex<()>>>>,
}

impl SummaryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `month`, created on first use
    pub fn lock_for(&self, month: MonthKey) -> Arc<Mutex<()>> {
        let mut months = self.months.lock().unwrap_or_else(PoisonError::into_inner);
        months.entry(month).or_default().clone()
    }

    /// Number of months that have been locked at least once
    pub fn len(&self) -> usize {
        self.months
            .lock()
            .map(|m| m.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquire a month lock, ignoring poisoning from a panicked writer
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
