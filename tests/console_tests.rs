//! Console Tests
//!
//! Tests verify:
//! - Command parsing, including verbatim write payloads
//! - Parse errors for malformed lines
//! - Execution against a registry

use scull::console::{self, Command};
use scull::{Config, Scull, ScullError};

fn small_scull() -> Scull {
    let config = Config::builder().device_count(2).quantum(4).qset(2).build();
    Scull::new(config).unwrap()
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_write_keeps_payload_verbatim() {
    let command = Command::parse("write 1 5 hello  world").unwrap();

    assert_eq!(
        command,
        Command::Write {
            device: 1,
            offset: 5,
            data: b"hello  world".to_vec(),
        }
    );
}

#[test]
fn test_parse_simple_commands() {
    assert_eq!(
        Command::parse("read 0 10 4").unwrap(),
        Command::Read {
            device: 0,
            offset: 10,
            len: 4
        }
    );
    assert_eq!(Command::parse("  reset 3 ").unwrap(), Command::Reset { device: 3 });
    assert_eq!(Command::parse("quantum 64").unwrap(), Command::Quantum { quantum: 64 });
    assert_eq!(Command::parse("qset 8").unwrap(), Command::Qset { qset: 8 });
    assert_eq!(Command::parse("stat").unwrap(), Command::Stat);
    assert_eq!(Command::parse("?").unwrap(), Command::Help);
    assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
}

#[test]
fn test_parse_errors() {
    for line in ["", "bogus", "read 0 x 3", "read 0 1", "reset", "qset -1", "write zero 0 hi"] {
        assert!(
            matches!(Command::parse(line), Err(ScullError::Parse(_))),
            "expected parse error for {:?}",
            line
        );
    }
}

// =============================================================================
// Execution Tests
// =============================================================================

#[test]
fn test_execute_write_then_read() {
    let scull = small_scull();

    let out = console::execute(&scull, Command::parse("write 0 0 hello world").unwrap()).unwrap();
    assert_eq!(out, "wrote 11 bytes, size 11");

    let out = console::execute(&scull, Command::parse("read 0 6 20").unwrap()).unwrap();
    assert_eq!(out, "read 5 bytes: \"world\"");
}

#[test]
fn test_execute_read_with_huge_length() {
    let scull = small_scull();
    let command = Command::parse("read 0 0 18446744073709551615").unwrap();

    let out = console::execute(&scull, command.clone()).unwrap();
    assert_eq!(out, "read 0 bytes: \"\"");

    console::execute(&scull, Command::parse("write 0 0 hello world").unwrap()).unwrap();
    let out = console::execute(&scull, command).unwrap();
    assert_eq!(out, "read 11 bytes: \"hello world\"");

    let out = console::execute(&scull, Command::parse("read 0 99 18446744073709551615").unwrap()).unwrap();
    assert_eq!(out, "read 0 bytes: \"\"");
}

#[test]
fn test_execute_reset_and_stat() {
    let scull = small_scull();
    console::execute(&scull, Command::parse("write 1 0 abcdefghij").unwrap()).unwrap();

    let stat = console::execute(&scull, Command::Stat).unwrap();
    assert!(stat.contains("scull1: qset 2 quantum 4 size 10 nodes 2 quanta 3"));
    assert_eq!(stat.lines().count(), 3);
    assert!(stat.starts_with("scull0: qset 2 quantum 4 size 0 nodes 0 quanta 0 charged 0\n"));

    console::execute(&scull, Command::Reset { device: 1 }).unwrap();
    let stat = console::execute(&scull, Command::Stat).unwrap();
    assert!(stat.contains("scull1: qset 2 quantum 4 size 0 nodes 0 quanta 0"));
    assert!(stat.ends_with("memory in use: 0 bytes"));
}

#[test]
fn test_execute_reconfiguration() {
    let scull = small_scull();

    let out = console::execute(&scull, Command::Quantum { quantum: 32 }).unwrap();
    assert_eq!(out, "default quantum 32 (qset 2)");

    let err = console::execute(&scull, Command::Qset { qset: 0 }).unwrap_err();
    assert!(matches!(err, ScullError::Config(_)));
}

#[test]
fn test_execute_unknown_device() {
    let scull = small_scull();

    let err = console::execute(&scull, Command::Reset { device: 7 }).unwrap_err();
    assert!(matches!(err, ScullError::NoSuchDevice { index: 7, count: 2 }));
}
