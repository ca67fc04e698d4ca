//! Device handles
//!
//! A file-like view of one device: a private position plus `std::io`
//! traits. Every `read`/`write` call is one engine call and so moves at most
//! one quantum; `read_exact` and `write_all` do the looping.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::device::{DeviceGuard, Interrupt, ScullDevice};
use crate::error::{Result, ScullError};

/// An open device
pub struct DeviceHandle {
    device: Arc<ScullDevice>,
    pos: u64,
    writable: bool,
    interrupt: Option<Interrupt>,
}

impl DeviceHandle {
    pub(crate) fn new(device: Arc<ScullDevice>, writable: bool, interrupt: Option<Interrupt>) -> Self {
        Self {
            device,
            pos: 0,
            writable,
            interrupt,
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn device(&self) -> &Arc<ScullDevice> {
        &self.device
    }

    fn guard(&self) -> Result<DeviceGuard<'_>> {
        match &self.interrupt {
            Some(interrupt) => self.device.lock_interruptible(interrupt),
            None => Ok(self.device.lock()),
        }
    }

    /// One bounded read at the handle position
    pub fn read_at_pos(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pos = self.pos;
        let count = self.guard()?.read(&mut pos, buf)?;
        self.pos = pos;
        Ok(count)
    }

    /// One bounded write at the handle position
    pub fn write_at_pos(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.writable {
            return Err(ScullError::ReadOnly);
        }
        let mut pos = self.pos;
        let count = self.guard()?.write(&mut pos, buf)?;
        self.pos = pos;
        Ok(count)
    }

    /// Move one bounded chunk of at most `count` bytes out to `sink`
    pub fn copy_to<W: Write>(&mut self, sink: &mut W, count: usize) -> Result<usize> {
        let mut pos = self.pos;
        let moved = self.guard()?.read_to(&mut pos, count, sink)?;
        self.pos = pos;
        Ok(moved)
    }

    /// Move one bounded chunk of `count` bytes in from `source`
    pub fn copy_from<R: Read>(&mut self, source: &mut R, count: usize) -> Result<usize> {
        if !self.writable {
            return Err(ScullError::ReadOnly);
        }
        let mut pos = self.pos;
        let moved = self.guard()?.write_from(&mut pos, count, source)?;
        self.pos = pos;
        Ok(moved)
    }

    /// Reposition the handle; `End` is relative to the current device size
    pub fn seek_to(&mut self, target: SeekFrom) -> Result<u64> {
        let (base, delta) = match target {
            SeekFrom::Start(offset) => (0i128, offset as i128),
            SeekFrom::Current(delta) => (self.pos as i128, delta as i128),
            SeekFrom::End(delta) => (self.guard()?.size() as i128, delta as i128),
        };
        let next = base + delta;
        if next < 0 || next > u64::MAX as i128 {
            return Err(ScullError::InvalidSeek(next));
        }
        self.pos = next as u64;
        Ok(self.pos)
    }
}

impl Read for DeviceHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_at_pos(buf)?)
    }
}

impl Write for DeviceHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_at_pos(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for DeviceHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}
