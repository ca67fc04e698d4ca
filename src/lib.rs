//! # scull
//!
//! A sparse, growable in-memory character device store with:
//! - Lazily allocated fixed-size quanta grouped into quantum sets
//! - A singly-linked chain of quantum sets addressed by linear offset
//! - One coarse, interruptible lock per device
//! - Latched process-wide sizing that applies on the next reset
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Console / DeviceHandle (io traits)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ (index, offset, buffer, length)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Registry (Scull)                         │
//! │           device table, sizing defaults, budget             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ ScullDevice │   ...    │ ScullDevice │
//!   │   (Mutex)   │          │   (Mutex)   │
//!   └──────┬──────┘          └─────────────┘
//!          ▼
//!   ┌─────────────┐
//!   │DeviceStorage│  quantum set chain + read/write engine
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod device;
pub mod handle;
pub mod registry;
pub mod console;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ScullError};
pub use config::{Config, Sizing};
pub use device::{DeviceGuard, Interrupt, ScullDevice};
pub use handle::DeviceHandle;
pub use registry::{OpenOptions, Scull};
pub use storage::{DeviceStats, DeviceStorage, MemoryBudget};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scull
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
