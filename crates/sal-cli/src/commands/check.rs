//! Check command - load and normalize the worksheet without auditing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use colored::Colorize;
use sal::Generator;

pub fn run(config: PathBuf, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = super::load_pipeline(&config)?;

    println!(
        "{} {}",
        "Checking".cyan().bold(),
        pipeline.config().input_path().display().to_string().white()
    );

    let prepared = pipeline.prepare()?;
    let generator = Generator::from_config(pipeline.config())?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut unformatted = Vec::new();
    let mut missing_pdf = 0;
    for record in &prepared.records {
        *by_type.entry(record.statute_type.slug()).or_default() += 1;
        if generator.formatters().get(record.statute_type).is_none() {
            unformatted.push(record);
        }
        if record.pdf_start_page.is_none() {
            missing_pdf += 1;
        }
    }

    if verbose {
        println!();
        println!("{}", "Source:".yellow().bold());
        println!("  Format:  {}", prepared.source.format);
        println!("  Rows:    {}", prepared.source.row_count);
        println!("  Columns: {}", prepared.source.column_count);
        println!("  Hash:    {}", prepared.source.hash);
    }

    println!();
    println!(
        "Normalized {} statutes",
        prepared.records.len().to_string().white().bold()
    );
    for (slug, count) in &by_type {
        println!("  {:14} {}", slug, count);
    }
    println!(
        "  {} without a recorded PDF start page",
        missing_pdf.to_string().yellow()
    );

    if !unformatted.is_empty() {
        println!();
        println!("{}", "No formatter configured for:".red().bold());
        for record in &unformatted {
            println!(
                "  row {}: {} ({})",
                record.row,
                record.describe(),
                record.statute_type.slug()
            );
        }
        return Err(format!(
            "{} statutes cannot be generated; extend the generator map",
            unformatted.len()
        )
        .into());
    }

    println!();
    println!("{} phase: {}", "Ready".green().bold(), pipeline.phase());
    Ok(())
}
