//! Generate command - render the audited dataset as HTML.

use std::path::PathBuf;

use colored::Colorize;
use sal::{Phase, Pipeline};

pub fn run(config: PathBuf, force: bool, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;

    if pipeline.phase() == Phase::Audit {
        return Err(format!(
            "Audited dataset not found: {}\nRun 'sal audit' first.",
            pipeline.config().audited_path().display()
        )
        .into());
    }

    generate(&pipeline, force)
}

pub(crate) fn generate(pipeline: &Pipeline, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let output = pipeline.config().output_path();
    if output.exists() && !force {
        return Err(format!(
            "Output already exists: {}\nUse --force to overwrite.",
            output.display()
        )
        .into());
    }

    let document = pipeline.generate_to_file(force)?;

    println!(
        "{} {} statutes in {} sessions",
        "Generated".green().bold(),
        document.fragment_count.to_string().white().bold(),
        document.session_count
    );
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );
    Ok(())
}
