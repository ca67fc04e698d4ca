//! Tests for ScullDevice and its access guard
//!
//! These tests verify:
//! - One-shot read/write/reset through the guard
//! - Mutual exclusion on one device
//! - Independence of different devices
//! - Interruptible lock acquisition

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scull::storage::QuantumSet;
use scull::{Interrupt, ScullDevice, ScullError, Sizing};

// =============================================================================
// Helper Functions
// =============================================================================

fn device(quantum: usize, qset: usize) -> Arc<ScullDevice> {
    Arc::new(ScullDevice::standalone(Sizing::new(quantum, qset).unwrap()))
}

fn write_fully(device: &ScullDevice, mut pos: u64, data: &[u8]) {
    let mut written = 0;
    while written < data.len() {
        written += device.write(&mut pos, &data[written..]).unwrap();
    }
}

fn read_fully(device: &ScullDevice, mut pos: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let count = device.read(&mut pos, &mut buf[filled..]).unwrap();
        if count == 0 {
            break;
        }
        filled += count;
    }
    buf.truncate(filled);
    buf
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_device_write_read_reset() {
    let device = device(4, 2);

    write_fully(&device, 0, &[0xAB; 10]);
    assert_eq!(device.size(), 10);
    assert_eq!(read_fully(&device, 0, 10), vec![0xAB; 10]);
    assert!(read_fully(&device, 10, 4).is_empty());

    device.reset();
    assert_eq!(device.size(), 0);
    assert!(read_fully(&device, 0, 4).is_empty());
    assert_eq!(device.stats().qset_nodes, 0);
}

#[test]
fn test_guard_runs_several_operations_atomically() {
    let device = device(8, 2);
    let mut guard = device.lock();

    let mut pos = 0;
    assert_eq!(guard.write(&mut pos, b"abc").unwrap(), 3);
    assert_eq!(guard.size(), 3);

    let mut pos = 0;
    let mut buf = [0u8; 3];
    assert_eq!(guard.read(&mut pos, &mut buf).unwrap(), 3);
    assert_eq!(&buf, b"abc");

    guard.reset();
    assert_eq!(guard.size(), 0);
}

#[test]
fn test_guard_exposes_translator() {
    let device = device(4, 2);
    let mut guard = device.lock();

    let first = guard.follow(2).unwrap() as *const QuantumSet;
    let second = guard.follow(2).unwrap() as *const QuantumSet;

    assert!(std::ptr::eq(first, second));
    assert_eq!(guard.stats().qset_nodes, 3);
    assert_eq!(guard.size(), 0);
}

// =============================================================================
// Mutual Exclusion Tests
// =============================================================================

#[test]
fn test_guard_blocks_other_callers() {
    let device = device(8, 2);
    let done = Arc::new(AtomicBool::new(false));

    let guard = device.lock();

    let handle = {
        let device = Arc::clone(&device);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut pos = 0;
            device.write(&mut pos, b"late").unwrap();
            done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!done.load(Ordering::SeqCst));
    assert_eq!(guard.size(), 0);

    drop(guard);
    handle.join().unwrap();

    assert!(done.load(Ordering::SeqCst));
    assert_eq!(read_fully(&device, 0, 4), b"late".to_vec());
}

#[test]
fn test_concurrent_writes_never_tear_a_quantum() {
    let device = device(64, 4);

    crossbeam::thread::scope(|s| {
        for value in 0..8u8 {
            let device = &device;
            s.spawn(move |_| {
                let data = [value; 64];
                for _ in 0..200 {
                    let mut pos = 0;
                    assert_eq!(device.write(&mut pos, &data).unwrap(), 64);
                }
            });
        }
    })
    .unwrap();

    let data = read_fully(&device, 0, 64);
    assert_eq!(data.len(), 64);
    assert!(data.iter().all(|&b| b == data[0]));
    assert_eq!(device.size(), 64);
}

#[test]
fn test_concurrent_disjoint_writers() {
    let device = device(16, 4);
    let region = 1000usize;

    crossbeam::thread::scope(|s| {
        for writer in 0..8usize {
            let device = &device;
            s.spawn(move |_| {
                let data = vec![writer as u8 + 1; region];
                write_fully(device, (writer * region) as u64, &data);
            });
        }
    })
    .unwrap();

    assert_eq!(device.size(), (8 * region) as u64);
    for writer in 0..8usize {
        let data = read_fully(&device, (writer * region) as u64, region);
        assert_eq!(data, vec![writer as u8 + 1; region]);
    }
}

#[test]
fn test_concurrent_mixed_operations_leave_consistent_state() {
    let device = device(8, 2);

    crossbeam::thread::scope(|s| {
        for worker in 0..4u8 {
            let device = &device;
            s.spawn(move |_| {
                for round in 0..100 {
                    if worker == 0 && round % 10 == 0 {
                        device.reset();
                    } else {
                        write_fully(device, 0, &[worker; 8]);
                        let _ = read_fully(device, 0, 8);
                    }
                }
            });
        }
    })
    .unwrap();

    // Whatever order won, the chain agrees with the size
    let stats = device.stats();
    let size = device.size();
    assert!(size == 0 || size == 8);
    assert_eq!(stats.quanta, if size == 0 { 0 } else { 1 });
    let data = read_fully(&device, 0, 8);
    assert_eq!(data.len() as u64, size);
    assert!(data.iter().all(|&b| b == data.first().copied().unwrap_or(0)));
}

#[test]
fn test_different_devices_do_not_contend() {
    let busy = device(8, 2);
    let idle = device(8, 2);

    let _guard = busy.lock();

    let handle = {
        let idle = Arc::clone(&idle);
        thread::spawn(move || {
            let mut pos = 0;
            idle.write(&mut pos, b"free").unwrap()
        })
    };

    assert_eq!(handle.join().unwrap(), 4);
    assert_eq!(idle.size(), 4);
}

// =============================================================================
// Interruptible Acquire Tests
// =============================================================================

#[test]
fn test_raised_interrupt_while_locked_requests_restart() {
    let device = device(8, 2);
    let guard = device.lock();

    let interrupt = Interrupt::new();
    interrupt.raise();

    let handle = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            let result = device.lock_interruptible(&interrupt);
            matches!(result, Err(ScullError::RestartRequested))
        })
    };

    assert!(handle.join().unwrap());
    drop(guard);
    assert_eq!(device.size(), 0);
}

#[test]
fn test_interrupt_during_wait_requests_restart() {
    let device = device(8, 2);
    let guard = device.lock();
    let interrupt = Interrupt::new();

    let handle = {
        let device = Arc::clone(&device);
        let interrupt = interrupt.clone();
        thread::spawn(move || match device.lock_interruptible(&interrupt) {
            Ok(mut guard) => {
                let mut pos = 0;
                guard.write(&mut pos, b"x").map(|_| ())
            }
            Err(e) => Err(e),
        })
    };

    thread::sleep(Duration::from_millis(50));
    interrupt.raise();

    let result = handle.join().unwrap();
    assert!(matches!(result, Err(ScullError::RestartRequested)));

    drop(guard);
    assert_eq!(device.size(), 0);
    assert_eq!(device.stats().qset_nodes, 0);
}

#[test]
fn test_raised_interrupt_does_not_block_free_lock() {
    let device = device(8, 2);
    let interrupt = Interrupt::new();
    interrupt.raise();

    let mut guard = device.lock_interruptible(&interrupt).unwrap();
    let mut pos = 0;
    assert_eq!(guard.write(&mut pos, b"ok").unwrap(), 2);
}

#[test]
fn test_interruptible_waiter_acquires_after_release() {
    let device = device(8, 2);
    let guard = device.lock();
    let interrupt = Interrupt::new();

    let handle = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            let mut guard = device.lock_interruptible(&interrupt)?;
            let mut pos = 0;
            guard.write(&mut pos, b"after")
        })
    };

    thread::sleep(Duration::from_millis(30));
    drop(guard);

    assert_eq!(handle.join().unwrap().unwrap(), 5);
    assert_eq!(device.size(), 5);
}

#[test]
fn test_interrupt_can_be_cleared() {
    let interrupt = Interrupt::new();
    assert!(!interrupt.is_raised());

    let other = interrupt.clone();
    other.raise();
    assert!(interrupt.is_raised());

    interrupt.clear();
    assert!(!other.is_raised());
}
