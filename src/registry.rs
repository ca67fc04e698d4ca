//! Registry
//!
//! The device table: creates every device at start, maps an index to a
//! device, opens handles, and carries the process-wide sizing defaults.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Sizing, SizingDefaults};
use crate::device::{Interrupt, ScullDevice};
use crate::error::{Result, ScullError};
use crate::handle::DeviceHandle;
use crate::storage::{DeviceStats, MemoryBudget};

/// How a handle is opened
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    write: bool,
    truncate: bool,
    interrupt: Option<Interrupt>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only handle
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Write handle that resets the device on open
    pub fn write_truncate() -> Self {
        Self::default().write(true).truncate(true)
    }

    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Reset the device on open (only with write)
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Make every lock wait through the handle interruptible by `interrupt`
    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }
}

/// All devices of one scull instance
pub struct Scull {
    devices: Vec<Arc<ScullDevice>>,
    defaults: Arc<SizingDefaults>,
    budget: Arc<MemoryBudget>,
}

impl Scull {
    /// Validate `config` and create `device_count` empty devices
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let sizing = config.sizing()?;
        let defaults = Arc::new(SizingDefaults::new(sizing));
        let budget = Arc::new(MemoryBudget::new(config.memory_limit));
        let poll: Duration = config.lock_poll_interval();

        let devices = (0..config.device_count)
            .map(|index| {
                Arc::new(ScullDevice::new(
                    index,
                    Arc::clone(&defaults),
                    Arc::clone(&budget),
                    poll,
                ))
            })
            .collect();

        tracing::info!(
            devices = config.device_count,
            quantum = sizing.quantum(),
            qset = sizing.qset(),
            memory_limit = ?config.memory_limit,
            "scull initialized"
        );

        Ok(Self {
            devices,
            defaults,
            budget,
        })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, index: usize) -> Result<&Arc<ScullDevice>> {
        self.devices.get(index).ok_or(ScullError::NoSuchDevice {
            index,
            count: self.devices.len(),
        })
    }

    /// Open a handle on device `index`, resetting it for write-truncate
    pub fn open(&self, index: usize, options: OpenOptions) -> Result<DeviceHandle> {
        let device = Arc::clone(self.device(index)?);

        if options.write && options.truncate {
            let mut guard = match &options.interrupt {
                Some(interrupt) => device.lock_interruptible(interrupt)?,
                None => device.lock(),
            };
            guard.reset();
        }
        tracing::debug!(
            device = index,
            write = options.write,
            truncate = options.truncate,
            "device opened"
        );

        Ok(DeviceHandle::new(device, options.write, options.interrupt))
    }

    // =========================================================================
    // Process-wide Sizing
    // =========================================================================

    /// Sizing new and freshly reset devices will use
    pub fn sizing(&self) -> Sizing {
        self.defaults.snapshot()
    }

    /// Change the default quantum; existing devices keep theirs until reset
    pub fn set_quantum(&self, quantum: usize) -> Result<Sizing> {
        let sizing = self.defaults.set_quantum(quantum)?;
        tracing::info!(quantum, "default quantum changed");
        Ok(sizing)
    }

    /// Change the default qset; existing devices keep theirs until reset
    pub fn set_qset(&self, qset: usize) -> Result<Sizing> {
        let sizing = self.defaults.set_qset(qset)?;
        tracing::info!(qset, "default qset changed");
        Ok(sizing)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn stats(&self) -> Vec<DeviceStats> {
        self.devices.iter().map(|device| device.stats()).collect()
    }

    /// Bytes charged across all devices
    pub fn memory_used(&self) -> usize {
        self.budget.used()
    }

    /// Release every device's storage
    pub fn shutdown(self) {
        for device in &self.devices {
            device.reset();
        }
        tracing::info!(devices = self.devices.len(), "scull shut down");
    }
}
