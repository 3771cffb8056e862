//! Interactive confirmation of PDF start pages on the terminal.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use sal::audit::{PendingConfirmation, Responder};
use sal::{Response, SalError};

/// What the curator typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Accept,
    Page(u32),
    AskPage,
    Exit,
    Invalid,
}

fn parse_answer(input: &str) -> Answer {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Answer::Accept,
        "n" | "no" => Answer::AskPage,
        "exit" | "quit" | "q" => Answer::Exit,
        other => match other.parse::<u32>() {
            Ok(page) if page > 0 => Answer::Page(page),
            _ => Answer::Invalid,
        },
    }
}

/// Asks the curator about each record on stdin.
///
/// End of input stops the session like `exit` does.
pub struct TerminalResponder<R> {
    input: R,
    verbose: bool,
    session: Option<u32>,
}

impl TerminalResponder<io::StdinLock<'static>> {
    pub fn stdin(verbose: bool) -> Self {
        Self::new(io::stdin().lock(), verbose)
    }
}

impl<R: BufRead> TerminalResponder<R> {
    pub fn new(input: R, verbose: bool) -> Self {
        Self {
            input,
            verbose,
            session: None,
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> sal::Result<Option<String>> {
        print!("{}", prompt);
        io::stdout()
            .flush()
            .map_err(|e| SalError::io("<stdout>", e))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| SalError::io("<stdin>", e))?;
        Ok((read > 0).then_some(line))
    }

    fn show(&mut self, pending: &PendingConfirmation) -> sal::Result<()> {
        let record = &pending.record;
        if self.session != Some(record.session) {
            println!();
            println!("{}", record.session_heading()?.cyan().bold());
            self.session = Some(record.session);
        }

        println!();
        println!(
            "{} {}",
            pending.progress().dimmed(),
            record.describe().white().bold()
        );
        println!(
            "  {}  pages {}-{}  row {}",
            pending.citation(),
            record.start_page,
            record.end_page,
            pending.row
        );
        if self.verbose {
            if let Some(previous) = pending.previous_pdf_start_page {
                println!("  previous statute starts on PDF page {}", previous);
            }
            if let Some(recorded) = record.pdf_start_page {
                if recorded != pending.expected_pdf_start_page {
                    println!("  worksheet gives PDF page {}", recorded.to_string().yellow());
                }
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Responder for TerminalResponder<R> {
    fn respond(&mut self, pending: &PendingConfirmation) -> sal::Result<Option<Response>> {
        self.show(pending)?;

        let prompt = format!(
            "  PDF start page {}? [Y/n/page/exit] ",
            pending.expected_pdf_start_page.to_string().green().bold()
        );
        loop {
            let Some(line) = self.ask(&prompt)? else {
                return Ok(None);
            };
            match parse_answer(&line) {
                Answer::Accept => return Ok(Some(Response::Accept)),
                Answer::Page(page) => return Ok(Some(Response::Override(page))),
                Answer::Exit => return Ok(None),
                Answer::AskPage => loop {
                    let Some(line) = self.ask("  Correct PDF start page: ")? else {
                        return Ok(None);
                    };
                    match parse_answer(&line) {
                        Answer::Page(page) => return Ok(Some(Response::Override(page))),
                        Answer::Exit => return Ok(None),
                        _ => println!("  {}", "Enter a page number above zero".red()),
                    }
                },
                Answer::Invalid => {
                    println!("  {}", "Enter y, n, a page number, or exit".red())
                }
            }
        }
    }
}
