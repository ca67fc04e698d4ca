//! Console Module
//!
//! A line-oriented front end over a `Scull` registry.
//!
//! ## Commands
//! - `write <dev> <offset> <text>`  write text, looping over quanta
//! - `read <dev> <offset> <len>`    read up to len bytes
//! - `reset <dev>`                  drop a device's data
//! - `quantum <n>` / `qset <n>`     change defaults (applied on next reset)
//! - `stat`                         per-device allocation report
//! - `help`, `quit`

mod command;

pub use command::Command;

use crate::error::Result;
use crate::registry::Scull;

pub const HELP: &str = "\
commands:
  write <dev> <offset> <text>
  read <dev> <offset> <len>
  reset <dev>
  quantum <bytes>
  qset <slots>
  stat
  help
  quit";

/// Execute a command and render its output
pub fn execute(scull: &Scull, command: Command) -> Result<String> {
    match command {
        Command::Write {
            device,
            offset,
            data,
        } => {
            let device = scull.device(device)?;
            let mut pos = offset;
            let mut written = 0;
            while written < data.len() {
                let count = device.write(&mut pos, &data[written..])?;
                if count == 0 {
                    break;
                }
                written += count;
            }
            Ok(format!("wrote {} bytes, size {}", written, device.size()))
        }
        Command::Read {
            device,
            offset,
            len,
        } => {
            let device = scull.device(device)?;
            // Nothing past the current size can be returned
            let available = device.size().saturating_sub(offset);
            let len = usize::try_from(available).map_or(len, |available| len.min(available));
            let mut buf = vec![0u8; len];
            let mut pos = offset;
            let mut filled = 0;
            while filled < len {
                let count = device.read(&mut pos, &mut buf[filled..])?;
                if count == 0 {
                    break;
                }
                filled += count;
            }
            buf.truncate(filled);
            Ok(format!(
                "read {} bytes: {:?}",
                filled,
                String::from_utf8_lossy(&buf)
            ))
        }
        Command::Reset { device } => {
            scull.device(device)?.reset();
            Ok(format!("device {} reset", device))
        }
        Command::Quantum { quantum } => {
            let sizing = scull.set_quantum(quantum)?;
            Ok(format!("default quantum {} (qset {})", sizing.quantum(), sizing.qset()))
        }
        Command::Qset { qset } => {
            let sizing = scull.set_qset(qset)?;
            Ok(format!("default qset {} (quantum {})", sizing.qset(), sizing.quantum()))
        }
        Command::Stat => {
            let mut lines: Vec<String> = scull
                .stats()
                .iter()
                .enumerate()
                .map(|(index, stats)| {
                    format!(
                        "scull{}: qset {} quantum {} size {} nodes {} quanta {} charged {}",
                        index,
                        stats.qset,
                        stats.quantum,
                        stats.size,
                        stats.qset_nodes,
                        stats.quanta,
                        stats.charged
                    )
                })
                .collect();
            lines.push(format!("memory in use: {} bytes", scull.memory_used()));
            Ok(lines.join("\n"))
        }
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}
