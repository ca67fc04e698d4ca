//! Interrupt signal
//!
//! A cancellation flag a blocked caller can be woken with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable interrupt flag shared between a waiter and whoever cancels it
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every waiter holding a clone of this flag to give up
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
