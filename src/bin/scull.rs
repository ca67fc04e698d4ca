//! scull console
//!
//! Creates a set of in-memory devices and drives them from stdin.

use std::io::{self, BufRead, Write};

use clap::Parser;
use scull::config::{DEFAULT_DEVICE_COUNT, DEFAULT_QSET, DEFAULT_QUANTUM};
use scull::console::{self, Command};
use scull::{Config, Scull};
use tracing_subscriber::{fmt, EnvFilter};

/// scull device console
#[derive(Parser, Debug)]
#[command(name = "scull")]
#[command(about = "Sparse in-memory character devices driven from stdin")]
#[command(version)]
struct Args {
    /// Number of devices
    #[arg(short = 'n', long, default_value_t = DEFAULT_DEVICE_COUNT)]
    devices: usize,

    /// Bytes per quantum
    #[arg(short, long, default_value_t = DEFAULT_QUANTUM)]
    quantum: usize,

    /// Quanta per quantum set
    #[arg(short = 's', long, default_value_t = DEFAULT_QSET)]
    qset: usize,

    /// Cap on bytes allocated across all devices
    #[arg(short, long)]
    memory_limit: Option<usize>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scull=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("scull v{}", scull::VERSION);

    let mut builder = Config::builder()
        .device_count(args.devices)
        .quantum(args.quantum)
        .qset(args.qset);
    if let Some(limit) = args.memory_limit {
        builder = builder.memory_limit(limit);
    }

    let scull = match Scull::new(builder.build()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to initialize devices: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&scull) {
        tracing::error!("Console error: {}", e);
        std::process::exit(1);
    }

    scull.shutdown();
}

/// Read commands line by line until EOF or `quit`
fn run(scull: &Scull) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                writeln!(stdout, "error: {}", e)?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        match console::execute(scull, command) {
            Ok(output) => writeln!(stdout, "{}", output)?,
            Err(e) => writeln!(stdout, "error: {}", e)?,
        }
        stdout.flush()?;
    }
    Ok(())
}
