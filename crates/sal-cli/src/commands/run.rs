//! Run command - advance the dataset by one phase.

use std::path::PathBuf;

use colored::Colorize;
use sal::Phase;

pub fn run(config: PathBuf, force: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;

    let phase = pipeline.phase();
    if verbose {
        println!("{} {}", "Phase:".yellow().bold(), phase);
    }

    match phase {
        Phase::Audit => {
            if super::audit::audit(&pipeline, force, verbose)? {
                println!();
                super::generate::generate(&pipeline, force)?;
            }
        }
        Phase::Generate => super::generate::generate(&pipeline, force)?,
        Phase::Done if force => super::generate::generate(&pipeline, true)?,
        Phase::Done => {
            println!(
                "{} {} is up to date",
                "Done:".green().bold(),
                pipeline.config().output_path().display()
            );
            println!(
                "Run {} to regenerate it.",
                "sal run --force".cyan().bold()
            );
        }
    }

    Ok(())
}
