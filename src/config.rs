//! Configuration for scull
//!
//! Centralized configuration with sensible defaults, plus the process-wide
//! sizing defaults that devices latch at construction and reset time.

use std::time::Duration;

use parking_lot::RwLock;

use crate::error::{Result, ScullError};

/// Default number of devices in a registry
pub const DEFAULT_DEVICE_COUNT: usize = 4;

/// Default quantum size in bytes
pub const DEFAULT_QUANTUM: usize = 4000;

/// Default number of quanta per quantum set
pub const DEFAULT_QSET: usize = 1000;

/// Main configuration for a scull registry
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Table
    // -------------------------------------------------------------------------
    /// Number of devices, addressed by index in `[0, device_count)`
    pub device_count: usize,

    // -------------------------------------------------------------------------
    // Storage Sizing
    // -------------------------------------------------------------------------
    /// Bytes per quantum buffer
    pub quantum: usize,

    /// Quantum slots per quantum set
    pub qset: usize,

    /// Upper bound on bytes charged across all devices (None = unbounded)
    pub memory_limit: Option<usize>,

    // -------------------------------------------------------------------------
    // Locking
    // -------------------------------------------------------------------------
    /// How often an interruptible lock wait re-checks its interrupt
    pub lock_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_count: DEFAULT_DEVICE_COUNT,
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
            memory_limit: None,
            lock_poll_interval_ms: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration describes a usable registry
    pub fn validate(&self) -> Result<()> {
        if self.device_count == 0 {
            return Err(ScullError::Config("device_count must be positive".to_string()));
        }
        Sizing::new(self.quantum, self.qset)?;
        Ok(())
    }

    /// Sizing snapshot described by this config
    pub fn sizing(&self) -> Result<Sizing> {
        Sizing::new(self.quantum, self.qset)
    }

    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms.max(1))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the number of devices
    pub fn device_count(mut self, count: usize) -> Self {
        self.config.device_count = count;
        self
    }

    /// Set the quantum size (in bytes)
    pub fn quantum(mut self, quantum: usize) -> Self {
        self.config.quantum = quantum;
        self
    }

    /// Set the number of quanta per quantum set
    pub fn qset(mut self, qset: usize) -> Self {
        self.config.qset = qset;
        self
    }

    /// Cap the total bytes the registry may allocate
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.config.memory_limit = Some(bytes);
        self
    }

    /// Set the interrupt polling interval (in milliseconds)
    pub fn lock_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.lock_poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Sizing
// =============================================================================

/// Validated storage geometry: bytes per quantum and quanta per set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizing {
    quantum: usize,
    qset: usize,
}

impl Sizing {
    /// Both values must be positive and `quantum * qset` must fit in a usize
    pub fn new(quantum: usize, qset: usize) -> Result<Self> {
        if quantum == 0 {
            return Err(ScullError::Config("quantum must be positive".to_string()));
        }
        if qset == 0 {
            return Err(ScullError::Config("qset must be positive".to_string()));
        }
        if quantum.checked_mul(qset).is_none() {
            return Err(ScullError::Config(format!(
                "quantum * qset overflows ({} * {})",
                quantum, qset
            )));
        }
        Ok(Self { quantum, qset })
    }

    pub fn quantum(&self) -> usize {
        self.quantum
    }

    pub fn qset(&self) -> usize {
        self.qset
    }

    /// Bytes addressed by one full quantum set
    pub fn set_span(&self) -> u64 {
        (self.quantum * self.qset) as u64
    }
}

impl Default for Sizing {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
        }
    }
}

/// Process-wide sizing defaults
///
/// Changing these does not touch existing devices: each device copies a
/// snapshot at construction and again on every reset.
#[derive(Debug, Default)]
pub struct SizingDefaults {
    current: RwLock<Sizing>,
}

impl SizingDefaults {
    pub fn new(sizing: Sizing) -> Self {
        Self {
            current: RwLock::new(sizing),
        }
    }

    /// Copy of the current defaults
    pub fn snapshot(&self) -> Sizing {
        *self.current.read()
    }

    pub fn set_quantum(&self, quantum: usize) -> Result<Sizing> {
        let mut current = self.current.write();
        *current = Sizing::new(quantum, current.qset)?;
        Ok(*current)
    }

    pub fn set_qset(&self, qset: usize) -> Result<Sizing> {
        let mut current = self.current.write();
        *current = Sizing::new(current.quantum, qset)?;
        Ok(*current)
    }
}
