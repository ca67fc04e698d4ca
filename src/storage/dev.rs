//! Device storage
//!
//! The per-device root: chain head, latched sizing, logical size, and the
//! read/write engine that moves at most one quantum per call.

use std::sync::Arc;

use crate::config::Sizing;
use crate::error::{Result, ScullError};

use super::qset::alloc_quantum;
use super::{Ledger, MemoryBudget, QuantumSet, QSET_NODE_BYTES};

/// Snapshot of a device's allocation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    pub quantum: usize,
    pub qset: usize,
    /// Logical bytes stored
    pub size: u64,
    /// Quantum set nodes linked into the chain
    pub qset_nodes: usize,
    /// Nodes whose slot array has been allocated
    pub slot_arrays: usize,
    /// Allocated quanta across all nodes
    pub quanta: usize,
    /// Bytes charged to the shared budget
    pub charged: usize,
}

/// Where a linear offset lands in the chain
#[derive(Debug, Clone, Copy)]
struct Position {
    /// Index of the quantum set
    item: usize,
    /// Slot within the quantum set
    slot: usize,
    /// Byte offset within the quantum
    offset: usize,
}

/// Storage for one device
///
/// Not synchronized on its own; `ScullDevice` wraps it in the access guard.
#[derive(Debug)]
pub struct DeviceStorage {
    /// First quantum set (absent until first write)
    head: Option<Box<QuantumSet>>,

    /// Geometry captured at construction or last reset
    sizing: Sizing,

    /// High-water mark of bytes written
    size: u64,

    /// Bytes this device has charged to the shared budget
    ledger: Ledger,
}

impl DeviceStorage {
    pub fn new(sizing: Sizing, budget: Arc<MemoryBudget>) -> Self {
        Self {
            head: None,
            sizing,
            size: 0,
            ledger: Ledger::new(budget),
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    pub fn head(&self) -> Option<&QuantumSet> {
        self.head.as_deref()
    }

    // =========================================================================
    // Address Translation
    // =========================================================================

    /// Return the `n`-th quantum set, creating and linking every missing node
    /// on the way. Nodes linked before an allocation failure stay linked.
    pub fn follow(&mut self, n: usize) -> Result<&mut QuantumSet> {
        follow_in(&mut self.head, &mut self.ledger, n)
    }

    /// Non-allocating walk to the `n`-th quantum set
    pub fn lookup(&self, n: usize) -> Option<&QuantumSet> {
        let mut node = self.head.as_deref()?;
        for _ in 0..n {
            node = node.next.as_deref()?;
        }
        Some(node)
    }

    fn locate(&self, pos: u64) -> Position {
        let quantum = self.sizing.quantum();
        let span = self.sizing.set_span();
        let rest = (pos % span) as usize;
        Position {
            item: (pos / span) as usize,
            slot: rest / quantum,
            offset: rest % quantum,
        }
    }

    // =========================================================================
    // Read/Write Engine
    // =========================================================================

    /// Hand at most `count` bytes starting at `*pos` to `copy`.
    ///
    /// Never crosses a quantum boundary. Returns 0 at or past the end of data
    /// and for holes. `*pos` advances only when `copy` succeeds.
    pub fn read_with<F>(&self, pos: &mut u64, count: usize, copy: F) -> Result<usize>
    where
        F: FnOnce(&[u8]) -> std::io::Result<()>,
    {
        if *pos >= self.size {
            return Ok(0);
        }
        let available = self.size - *pos;
        let count = (count as u64).min(available) as usize;

        let at = self.locate(*pos);
        let Some(quantum) = self.lookup(at.item).and_then(|node| node.quantum(at.slot)) else {
            tracing::trace!(pos = *pos, item = at.item, slot = at.slot, "read hit a hole");
            return Ok(0);
        };

        let count = count.min(quantum.len() - at.offset);
        copy(&quantum[at.offset..at.offset + count]).map_err(ScullError::CopyFault)?;
        *pos += count as u64;
        Ok(count)
    }

    /// Fill at most `count` bytes starting at `*pos` from `fill`.
    ///
    /// Allocates the path to the target quantum as needed and never crosses a
    /// quantum boundary. On allocation failure nothing already allocated is
    /// rolled back. `*pos` and the size move only when `fill` succeeds.
    pub fn write_with<F>(&mut self, pos: &mut u64, count: usize, fill: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]) -> std::io::Result<()>,
    {
        if count == 0 {
            return Ok(0);
        }
        let quantum = self.sizing.quantum();
        let qset = self.sizing.qset();
        let at = self.locate(*pos);

        let node = follow_in(&mut self.head, &mut self.ledger, at.item)?;
        let slots = node.slots_mut(qset, &mut self.ledger)?;
        let slot = &mut slots[at.slot];
        let buf = match slot {
            Some(buf) => buf,
            None => slot.insert(alloc_quantum(quantum, &mut self.ledger)?),
        };

        let count = count.min(quantum - at.offset);
        fill(&mut buf[at.offset..at.offset + count]).map_err(ScullError::CopyFault)?;
        *pos += count as u64;
        self.size = self.size.max(*pos);
        Ok(count)
    }

    /// Copy into `buf`, bounded by one quantum
    pub fn read(&self, pos: &mut u64, buf: &mut [u8]) -> Result<usize> {
        self.read_with(pos, buf.len(), |src| {
            buf[..src.len()].copy_from_slice(src);
            Ok(())
        })
    }

    /// Copy from `buf`, bounded by one quantum
    pub fn write(&mut self, pos: &mut u64, buf: &[u8]) -> Result<usize> {
        self.write_with(pos, buf.len(), |dst| {
            dst.copy_from_slice(&buf[..dst.len()]);
            Ok(())
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release every quantum and node, then adopt `sizing` with size 0
    pub fn trim(&mut self, sizing: Sizing) {
        self.release_chain();
        self.sizing = sizing;
        self.size = 0;
    }

    /// Unlink nodes one at a time so long chains never recurse on drop
    fn release_chain(&mut self) {
        let mut next = self.head.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
        self.ledger.release_all();
    }

    pub fn stats(&self) -> DeviceStats {
        let mut stats = DeviceStats {
            quantum: self.sizing.quantum(),
            qset: self.sizing.qset(),
            size: self.size,
            charged: self.ledger.charged(),
            ..DeviceStats::default()
        };
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            stats.qset_nodes += 1;
            if current.has_slots() {
                stats.slot_arrays += 1;
            }
            stats.quanta += current.quanta();
            node = current.next.as_deref();
        }
        stats
    }
}

impl Drop for DeviceStorage {
    fn drop(&mut self) {
        self.release_chain();
    }
}

/// Walk `n` links from `link`, attaching empty nodes where the chain ends.
///
/// The missing tail is checked against real memory before anything is
/// linked, so a far offset fails with OutOfMemory instead of aborting.
fn follow_in<'a>(
    mut link: &'a mut Option<Box<QuantumSet>>,
    ledger: &mut Ledger,
    n: usize,
) -> Result<&'a mut QuantumSet> {
    let missing = missing_nodes(link, n);
    if missing > 0 {
        ledger.ensure_backing::<QuantumSet>(missing)?;
    }
    for _ in 0..n {
        link = &mut attach(link, ledger)?.next;
    }
    attach(link, ledger)
}

/// Nodes that must be created for index `n` to exist, saturating at usize::MAX
fn missing_nodes(mut link: &Option<Box<QuantumSet>>, n: usize) -> usize {
    let mut depth = 0;
    while let Some(node) = link {
        if depth == n {
            return 0;
        }
        link = &node.next;
        depth += 1;
    }
    (n - depth).saturating_add(1)
}

fn attach<'a>(
    link: &'a mut Option<Box<QuantumSet>>,
    ledger: &mut Ledger,
) -> Result<&'a mut QuantumSet> {
    if link.is_none() {
        ledger.charge(QSET_NODE_BYTES)?;
    }
    let node: &mut QuantumSet = link.get_or_insert_with(Box::default);
    Ok(node)
}
