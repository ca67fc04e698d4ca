//! Command definitions
//!
//! Represents one console line.

use crate::error::{Result, ScullError};

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write text to a device at an offset
    Write { device: usize, offset: u64, data: Vec<u8> },

    /// Read up to `len` bytes from a device at an offset
    Read { device: usize, offset: u64, len: usize },

    /// Reset a device
    Reset { device: usize },

    /// Change the default quantum
    Quantum { quantum: usize },

    /// Change the default qset
    Qset { qset: usize },

    /// Show per-device statistics
    Stat,

    Help,

    Quit,
}

impl Command {
    /// Parse a line such as `write 0 128 hello world`
    ///
    /// Everything after the offset of a `write` is taken verbatim as data.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = split_word(line);

        match verb {
            "write" => {
                let (device, rest) = split_word(rest);
                let (offset, data) = split_word(rest);
                Ok(Command::Write {
                    device: number(device, "device")?,
                    offset: number(offset, "offset")?,
                    data: data.as_bytes().to_vec(),
                })
            }
            "read" => {
                let args = words::<3>(rest, "read <device> <offset> <len>")?;
                Ok(Command::Read {
                    device: number(args[0], "device")?,
                    offset: number(args[1], "offset")?,
                    len: number(args[2], "len")?,
                })
            }
            "reset" => {
                let [device] = words::<1>(rest, "reset <device>")?;
                Ok(Command::Reset {
                    device: number(device, "device")?,
                })
            }
            "quantum" => {
                let [quantum] = words::<1>(rest, "quantum <bytes>")?;
                Ok(Command::Quantum {
                    quantum: number(quantum, "quantum")?,
                })
            }
            "qset" => {
                let [qset] = words::<1>(rest, "qset <slots>")?;
                Ok(Command::Qset {
                    qset: number(qset, "qset")?,
                })
            }
            "stat" => Ok(Command::Stat),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(ScullError::Parse("empty command".to_string())),
            other => Err(ScullError::Parse(format!("unknown command: {}", other))),
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

fn words<'a, const N: usize>(input: &'a str, usage: &str) -> Result<[&'a str; N]> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    parts
        .try_into()
        .map_err(|_| ScullError::Parse(format!("usage: {}", usage)))
}

fn number<T: std::str::FromStr>(word: &str, what: &str) -> Result<T> {
    word.parse()
        .map_err(|_| ScullError::Parse(format!("invalid {}: {:?}", what, word)))
}
