//! Audit command - confirm PDF start pages interactively.

use std::path::PathBuf;

use colored::Colorize;
use sal::audit::{AuditOutcome, release_lease};
use sal::{Phase, Pipeline};
use tracing::debug;

use crate::terminal::TerminalResponder;

pub fn run(config: PathBuf, force: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;

    if pipeline.phase() != Phase::Audit {
        println!(
            "{} audited dataset already exists at {}",
            "Nothing to audit:".yellow().bold(),
            pipeline.config().audited_path().display()
        );
        println!(
            "Run {} to build the HTML.",
            "sal generate".cyan().bold()
        );
        return Ok(());
    }

    audit(&pipeline, force, verbose)?;
    Ok(())
}

/// Run or resume the audit. Returns whether every record is now audited.
pub(crate) fn audit(
    pipeline: &Pipeline,
    force: bool,
    verbose: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let prepared = pipeline.prepare()?;
    let dataset = prepared.dataset.clone();

    println!(
        "{} {} ({} statutes, {} offsets)",
        "Auditing".cyan().bold(),
        pipeline.config().congress.white(),
        prepared.records.len(),
        pipeline.config().offset_policy
    );

    let engine = pipeline.audit_engine();
    if force {
        if let Some(lease) = engine.break_lease(&dataset)? {
            println!(
                "{} lease of session {} (pid {})",
                "Cleared".yellow().bold(),
                lease.session_id,
                lease.pid
            );
        }
    }

    let session = engine.start(&dataset, &prepared.source.hash, prepared.records)?;
    if session.is_complete() {
        println!("All statutes already confirmed; writing the audited dataset");
    } else if session.resume_index() > 0 {
        println!(
            "Resuming at statute {}/{}",
            session.resume_index() + 1,
            session.total()
        );
    }

    // The handler cannot reach the session, so it clears the lease through
    // the store. Everything already confirmed is on disk.
    let store = engine.store().clone();
    let session_id = session.session_id();
    let interrupted = dataset.clone();
    ctrlc::set_handler(move || {
        match release_lease(&store, &interrupted, session_id) {
            Ok(_) => eprintln!(
                "\n{} progress is saved; run {} to resume",
                "Interrupted:".yellow().bold(),
                "sal audit".cyan().bold()
            ),
            Err(e) => eprintln!("\nError: failed to release audit lease: {}", e),
        }
        std::process::exit(130);
    })?;
    debug!(session = %session_id, "interrupt handler installed");

    let mut responder = TerminalResponder::stdin(verbose);
    match pipeline.run_audit_session(session, &mut responder)? {
        AuditOutcome::Suspended {
            resume_index,
            total,
        } => {
            println!();
            println!(
                "{} after {}/{} statutes. Run {} to continue.",
                "Paused".yellow().bold(),
                resume_index,
                total,
                "sal audit".cyan().bold()
            );
            Ok(false)
        }
        AuditOutcome::Complete(audited) => {
            let warnings = audited
                .decisions
                .iter()
                .filter(|d| d.warning.is_some())
                .count();
            println!();
            println!(
                "{} {} statutes ({} overridden, {} out of order)",
                "Audited".green().bold(),
                audited.len().to_string().white().bold(),
                audited.override_count().to_string().blue(),
                warnings.to_string().yellow()
            );
            println!(
                "{} {}",
                "Saved to".green().bold(),
                pipeline.config().audited_path().display().to_string().white()
            );
            Ok(true)
        }
    }
}
