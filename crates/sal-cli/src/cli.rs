//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SAL: audit Statutes at Large worksheets and publish them as HTML
#[derive(Parser)]
#[command(name = "sal")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the Congress configuration
    #[arg(short, long, global = true, default_value = "user-config.yaml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the next phase: audit the worksheet, or generate HTML once audited
    Run {
        /// Clear a stale audit lease and overwrite existing output
        #[arg(short, long)]
        force: bool,
    },

    /// Load and normalize the worksheet without auditing
    Check,

    /// Confirm the PDF start page of each statute, resuming saved progress
    Audit {
        /// Clear a lease left by a session that did not exit cleanly
        #[arg(short, long)]
        force: bool,
    },

    /// Generate the HTML document from the audited dataset
    Generate {
        /// Overwrite an existing output file
        #[arg(short, long)]
        force: bool,
    },

    /// Show audit progress and pipeline phase
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Release the audit lease of a crashed session
    Unlock,
}
