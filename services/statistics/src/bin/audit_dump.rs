//! Dump audit log contents to stdout for inspection

use anyhow::Result;
use clap::Parser;
use payment_statistics::AuditLog;
use std::path::PathBuf;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "audit-dump", about = "Inspect the payment statistics audit log")]
struct Args {
    /// Audit log directory
    #[arg(long, default_value = "./data/audit")]
    dir: PathBuf,

    /// Only show records with an event time at or after this epoch-ms value
    #[arg(long)]
    from: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log = AuditLog::new(&args.dir, None)?;
    let stats = log.stats()?;
    println!(
        "audit log: {} segments, {} entries, {} bytes",
        stats.segment_count, stats.total_size, stats.total_entries
    );

    let from = args.from.map(services_common::Ts::from_millis);
    let mut iter = log.stream(from)?;
    let mut count = 0u64;
    while let Some(entry) = iter.read_next_entry()? {
        count += 1;
        println!(
            "{count}: amount={} timestamp={} accepted_at={}",
            entry.amount, entry.timestamp, entry.accepted_at
        );
    }
    println!("{count} records shown");

    Ok(())
}
