//! Unlock command - clear the lease of a session that did not exit cleanly.

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;

pub fn run(config: PathBuf, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;
    let dataset = pipeline.dataset_id();

    match pipeline.audit_engine().break_lease(&dataset)? {
        Some(lease) => {
            println!(
                "{} session {} (pid {}, started {})",
                "Unlocked".green().bold(),
                lease.session_id,
                lease.pid,
                lease.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            println!(
                "Run {} to resume the audit.",
                "sal audit".cyan().bold()
            );
        }
        None => println!("No audit lease held for {}", dataset.white()),
    }

    Ok(())
}
