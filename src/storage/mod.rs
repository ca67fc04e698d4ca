//! Storage Module
//!
//! Sparse, growable in-memory storage for one device.
//!
//! ## Responsibilities
//! - Own the chain of quantum sets and the logical size
//! - Translate a linear byte offset into (set, slot, offset)
//! - Allocate nodes, slot arrays and quanta lazily on write
//! - Account every allocation against a shared memory budget
//!
//! ## Layout
//! ```text
//!  head
//!   │
//!   ▼
//! ┌──────────────┐ next ┌──────────────┐ next
//! │ QuantumSet 0 │─────▶│ QuantumSet 1 │─────▶ ...
//! └──────┬───────┘      └──────┬───────┘
//!        │ data                │ data (may be absent)
//!        ▼                     ▼
//! ┌────┬────┬───┬────┐  ┌────┬────┬───┬────┐
//! │ q0 │ -- │...│ qN │  │ -- │ q1 │...│ -- │   (-- = hole)
//! └────┴────┴───┴────┘  └────┴────┴───┴────┘
//!   │
//!   ▼
//! [u8; quantum]
//! ```

mod budget;
mod dev;
mod qset;

pub use budget::MemoryBudget;
pub use dev::{DeviceStats, DeviceStorage};
pub use qset::{Quantum, QuantumSet, QSET_NODE_BYTES};

pub(crate) use budget::Ledger;

/// Bytes charged for a slot array of `qset` entries
pub fn slot_array_bytes(qset: usize) -> usize {
    qset * std::mem::size_of::<Option<Quantum>>()
}
