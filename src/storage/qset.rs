//! Quantum sets
//!
//! One node of the storage chain: a lazily allocated array of optional
//! quantum buffers and the link to the next node.

use std::mem;

use crate::error::Result;

use super::{slot_array_bytes, Ledger};

/// A fixed-size block of raw bytes, owned by exactly one slot
pub type Quantum = Box<[u8]>;

/// Bytes charged for one quantum set node
pub const QSET_NODE_BYTES: usize = mem::size_of::<QuantumSet>();

/// One node of the quantum set chain
///
/// A node with no slot array and no successor is legal: it was linked by
/// address translation but never written.
#[derive(Debug, Default)]
pub struct QuantumSet {
    /// Slot array, absent until the first write lands in this node
    pub(crate) data: Option<Vec<Option<Quantum>>>,

    /// Next node in the chain
    pub(crate) next: Option<Box<QuantumSet>>,
}

impl QuantumSet {
    /// Quantum stored at `slot`, or None for a hole
    pub fn quantum(&self, slot: usize) -> Option<&[u8]> {
        self.data.as_ref()?.get(slot)?.as_deref()
    }

    pub fn has_slots(&self) -> bool {
        self.data.is_some()
    }

    /// Number of allocated quanta in this node
    pub fn quanta(&self) -> usize {
        self.data
            .as_ref()
            .map_or(0, |slots| slots.iter().filter(|slot| slot.is_some()).count())
    }

    pub fn next(&self) -> Option<&QuantumSet> {
        self.next.as_deref()
    }

    /// Slot array, allocated with every slot absent if missing
    pub(crate) fn slots_mut(
        &mut self,
        qset: usize,
        ledger: &mut Ledger,
    ) -> Result<&mut [Option<Quantum>]> {
        if self.data.is_none() {
            let mut slots = ledger.reserve(slot_array_bytes(qset), qset)?;
            slots.resize_with(qset, || None);
            self.data = Some(slots);
        }
        Ok(self.data.get_or_insert_with(Vec::new).as_mut_slice())
    }
}

/// Allocate one zero-filled quantum of `quantum` bytes
pub(crate) fn alloc_quantum(quantum: usize, ledger: &mut Ledger) -> Result<Quantum> {
    let mut buf = ledger.reserve(quantum, quantum)?;
    buf.resize(quantum, 0u8);
    Ok(buf.into_boxed_slice())
}
