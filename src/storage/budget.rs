//! Memory accounting
//!
//! Every allocation made by the storage layer is charged against a budget
//! shared by all devices of a registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, ScullError};

/// Shared allocation budget
///
/// ## Concurrency:
/// - `used`: Atomic counter, devices charge and release without a lock
#[derive(Debug, Default)]
pub struct MemoryBudget {
    /// Upper bound in bytes (None = unbounded)
    limit: Option<usize>,

    /// Bytes currently charged
    used: AtomicUsize,
}

impl MemoryBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Reserve `bytes`, failing with OutOfMemory if the limit would be exceeded
    pub fn charge(&self, bytes: usize) -> Result<()> {
        let Some(limit) = self.limit else {
            self.used.fetch_add(bytes, Ordering::AcqRel);
            return Ok(());
        };

        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= limit)
            })
            .map(|_| ())
            .map_err(|in_use| ScullError::OutOfMemory {
                requested: bytes,
                in_use,
            })
    }

    pub fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }

    /// Bytes currently charged across all devices
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Per-device record of what it has charged to the shared budget
#[derive(Debug)]
pub(crate) struct Ledger {
    budget: Arc<MemoryBudget>,
    charged: usize,
}

impl Ledger {
    pub(crate) fn new(budget: Arc<MemoryBudget>) -> Self {
        Self { budget, charged: 0 }
    }

    pub(crate) fn charge(&mut self, bytes: usize) -> Result<()> {
        self.budget.charge(bytes)?;
        self.charged += bytes;
        Ok(())
    }

    pub(crate) fn release(&mut self, bytes: usize) {
        self.budget.release(bytes);
        self.charged -= bytes;
    }

    /// Return everything this device holds
    pub(crate) fn release_all(&mut self) {
        self.budget.release(self.charged);
        self.charged = 0;
    }

    pub(crate) fn charged(&self) -> usize {
        self.charged
    }

    /// Charge `bytes` and reserve a buffer of that many elements.
    ///
    /// On failure the charge is returned and nothing is reserved.
    pub(crate) fn reserve<T>(&mut self, bytes: usize, len: usize) -> Result<Vec<T>> {
        self.charge(bytes)?;
        let mut buf = Vec::new();
        if buf.try_reserve_exact(len).is_err() {
            self.release(bytes);
            return Err(ScullError::OutOfMemory {
                requested: bytes,
                in_use: self.budget.used(),
            });
        }
        Ok(buf)
    }

    /// Fail with OutOfMemory unless `count` values of `T` could be allocated
    /// now. Nothing is charged and the trial reservation is freed at once.
    pub(crate) fn ensure_backing<T>(&self, count: usize) -> Result<()> {
        let mut trial: Vec<T> = Vec::new();
        trial
            .try_reserve_exact(count)
            .map_err(|_| ScullError::OutOfMemory {
                requested: count.saturating_mul(std::mem::size_of::<T>()),
                in_use: self.budget.used(),
            })
    }
}
