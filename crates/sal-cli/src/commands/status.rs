//! Status command - show audit progress and pipeline phase.

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;
use sal::{AuditStatus, AuditedDataset, Phase};

pub fn run(config: PathBuf, json_output: bool, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;
    let phase = pipeline.phase();
    let audit = pipeline.audit_status()?;
    let audited: Option<AuditedDataset> = match phase {
        Phase::Audit => None,
        Phase::Generate | Phase::Done => Some(pipeline.load_audited()?),
    };

    if json_output {
        let status = serde_json::json!({
            "congress": pipeline.config().congress,
            "dataset": pipeline.dataset_id(),
            "phase": phase.label(),
            "audit": audit,
            "audited": audited.as_ref().map(|d| serde_json::json!({
                "path": pipeline.config().audited_path(),
                "records": d.len(),
                "overridden": d.override_count(),
                "completed_at": d.completed_at,
            })),
            "output": pipeline.config().output_path(),
            "output_exists": phase == Phase::Done,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Status for".cyan().bold(),
        pipeline.config().congress.white(),
        pipeline.dataset_id()
    );
    println!();

    match &audit {
        AuditStatus::InProgress {
            resume_index,
            total,
            lease,
        } => {
            let bar_width = 30;
            let filled = resume_index * bar_width / (*total).max(1);
            let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);
            println!(
                "Audit: {} {}/{}",
                bar.cyan(),
                resume_index.to_string().white().bold(),
                total
            );
            if let Some(lease) = lease {
                println!(
                    "  {} by session {} (pid {}) since {}",
                    "Locked".red().bold(),
                    lease.session_id,
                    lease.pid,
                    lease.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
                println!(
                    "  If that session is gone, run {}.",
                    "sal unlock".cyan().bold()
                );
            }
        }
        other if audited.is_none() => println!("Audit: {}", other.label()),
        _ => {}
    }

    if let Some(dataset) = &audited {
        println!(
            "Audit: {} ({} statutes, {} overridden, completed {})",
            "Complete".green().bold(),
            dataset.len(),
            dataset.override_count(),
            dataset.completed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }

    println!("Phase: {}", phase.label().white().bold());
    println!();

    match phase {
        Phase::Audit => println!(
            "Run {} to continue auditing.",
            "sal audit".cyan().bold()
        ),
        Phase::Generate => println!(
            "Run {} to build {}.",
            "sal generate".cyan().bold(),
            pipeline.config().output_path().display()
        ),
        Phase::Done => println!(
            "{} {}",
            "Output:".green().bold(),
            pipeline.config().output_path().display()
        ),
    }

    Ok(())
}
