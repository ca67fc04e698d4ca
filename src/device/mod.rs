//! Device Module
//!
//! A storage instance behind its access guard.
//!
//! ## Concurrency Model: one coarse lock per device
//!
//! - Every read, write and reset holds the device `Mutex` for its whole run
//! - Reads serialize too; there is no reader/writer split
//! - Different devices share nothing and never contend
//! - An interruptible acquire gives up with `RestartRequested` before it
//!   touches any state

mod signal;

pub use signal::Interrupt;

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::config::{Sizing, SizingDefaults};
use crate::error::{Result, ScullError};
use crate::storage::{DeviceStats, DeviceStorage, MemoryBudget, QuantumSet};

/// One scull device
pub struct ScullDevice {
    /// Position in the registry
    index: usize,

    /// Storage, guarded by the per-device lock
    storage: Mutex<DeviceStorage>,

    /// Process-wide sizing, re-read on every reset
    defaults: Arc<SizingDefaults>,

    /// Interrupt re-check interval while waiting for the lock
    poll: Duration,
}

impl ScullDevice {
    /// Create a device that latches the current defaults
    pub fn new(
        index: usize,
        defaults: Arc<SizingDefaults>,
        budget: Arc<MemoryBudget>,
        poll: Duration,
    ) -> Self {
        let storage = DeviceStorage::new(defaults.snapshot(), budget);
        Self {
            index,
            storage: Mutex::new(storage),
            defaults,
            poll,
        }
    }

    /// A lone device with its own defaults and an unbounded budget
    pub fn standalone(sizing: Sizing) -> Self {
        Self::new(
            0,
            Arc::new(SizingDefaults::new(sizing)),
            Arc::new(MemoryBudget::unbounded()),
            Duration::from_millis(10),
        )
    }

    pub fn index(&self) -> usize {
        self.index
    }

    // =========================================================================
    // Access Guard
    // =========================================================================

    /// Block until the device is ours
    pub fn lock(&self) -> DeviceGuard<'_> {
        self.guard(self.storage.lock())
    }

    /// Wait for the device unless `interrupt` is raised first
    ///
    /// A free lock is taken even if the interrupt is already raised.
    pub fn lock_interruptible(&self, interrupt: &Interrupt) -> Result<DeviceGuard<'_>> {
        if let Some(storage) = self.storage.try_lock() {
            return Ok(self.guard(storage));
        }
        loop {
            if interrupt.is_raised() {
                tracing::warn!(device = self.index, "lock wait interrupted");
                return Err(ScullError::RestartRequested);
            }
            if let Some(storage) = self.storage.try_lock_for(self.poll) {
                return Ok(self.guard(storage));
            }
        }
    }

    fn guard<'a>(&'a self, storage: MutexGuard<'a, DeviceStorage>) -> DeviceGuard<'a> {
        DeviceGuard {
            index: self.index,
            storage,
            defaults: &self.defaults,
        }
    }

    // =========================================================================
    // One-shot Operations
    // =========================================================================

    pub fn read(&self, pos: &mut u64, buf: &mut [u8]) -> Result<usize> {
        self.lock().read(pos, buf)
    }

    pub fn write(&self, pos: &mut u64, buf: &[u8]) -> Result<usize> {
        self.lock().write(pos, buf)
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    pub fn size(&self) -> u64 {
        self.lock().size()
    }

    pub fn stats(&self) -> DeviceStats {
        self.lock().stats()
    }
}

/// Exclusive access to one device; the lock is released on drop
pub struct DeviceGuard<'a> {
    index: usize,
    storage: MutexGuard<'a, DeviceStorage>,
    defaults: &'a SizingDefaults,
}

impl DeviceGuard<'_> {
    /// Read at most one quantum's worth into `buf`
    pub fn read(&mut self, pos: &mut u64, buf: &mut [u8]) -> Result<usize> {
        let start = *pos;
        let count = self.storage.read(pos, buf)?;
        tracing::trace!(device = self.index, pos = start, count, "read");
        Ok(count)
    }

    /// Write at most one quantum's worth from `buf`
    pub fn write(&mut self, pos: &mut u64, buf: &[u8]) -> Result<usize> {
        let start = *pos;
        let count = self.storage.write(pos, buf).inspect_err(|e| self.log_failure(e))?;
        tracing::trace!(device = self.index, pos = start, count, "write");
        Ok(count)
    }

    /// Read at most `count` bytes (one quantum) straight into `sink`
    pub fn read_to<W: Write>(&mut self, pos: &mut u64, count: usize, sink: &mut W) -> Result<usize> {
        self.storage.read_with(pos, count, |src| sink.write_all(src))
    }

    /// Write at most `count` bytes (one quantum) straight from `source`
    pub fn write_from<R: Read>(
        &mut self,
        pos: &mut u64,
        count: usize,
        source: &mut R,
    ) -> Result<usize> {
        self.storage
            .write_with(pos, count, |dst| source.read_exact(dst))
            .inspect_err(|e| self.log_failure(e))
    }

    /// Drop all data and latch the current process-wide sizing
    pub fn reset(&mut self) {
        let sizing = self.defaults.snapshot();
        self.storage.trim(sizing);
        tracing::debug!(
            device = self.index,
            quantum = sizing.quantum(),
            qset = sizing.qset(),
            "device reset"
        );
    }

    pub fn size(&self) -> u64 {
        self.storage.size()
    }

    pub fn sizing(&self) -> Sizing {
        self.storage.sizing()
    }

    pub fn stats(&self) -> DeviceStats {
        self.storage.stats()
    }

    /// Return the `n`-th quantum set, linking missing nodes on the way
    pub fn follow(&mut self, n: usize) -> Result<&mut QuantumSet> {
        self.storage.follow(n)
    }

    fn log_failure(&self, err: &ScullError) {
        if let ScullError::OutOfMemory { requested, in_use } = err {
            tracing::warn!(device = self.index, requested, in_use, "allocation failed");
        }
    }
}
