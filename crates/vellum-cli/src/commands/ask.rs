//! Ask command - ingest files, then answer questions about them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;
use vellum::{Answer, Vellum, VellumError};

use crate::cli::StoreArgs;

use super::{open_context, print_ingestion};

/// Output and chaining switches for the ask command.
#[derive(Debug, Clone, Copy, Default)]
pub struct AskOptions {
    pub trace: bool,
    pub follow_up: bool,
}

pub fn run(
    files: Vec<PathBuf>,
    store: StoreArgs,
    questions: Vec<String>,
    options: AskOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let vellum = open_context(&store)?;
    let outcome = answer_all(&vellum, &files, questions, options);
    vellum.close();
    outcome
}

fn answer_all(
    vellum: &Vellum,
    files: &[PathBuf],
    questions: Vec<String>,
    options: AskOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = vellum.ingest_paths(files)?;
    print_ingestion(&result);

    match vellum.ensure_session(&result) {
        Ok(_) => println!("{}", "Query agent is ready.".green()),
        Err(VellumError::NoSession(reason)) => {
            println!(
                "{} none of the uploaded files could be ingested",
                "No query session:".red().bold()
            );
            return Err(VellumError::NoSession(reason).into());
        }
        Err(e) => return Err(e.into()),
    }
    println!();

    let mut previous: Option<Answer> = None;
    if questions.is_empty() {
        let stdin = io::stdin();
        prompt()?;
        for line in stdin.lock().lines() {
            let question = line?;
            let question = question.trim();
            if !question.is_empty() {
                answer_one(vellum, question, options, &mut previous)?;
            }
            prompt()?;
        }
        println!();
    } else {
        for question in &questions {
            println!("{} {}", "?".cyan().bold(), question.white().bold());
            answer_one(vellum, question, options, &mut previous)?;
        }
    }

    Ok(())
}

fn prompt() -> io::Result<()> {
    print!("{} ", "Ask a question about your uploaded data:".cyan());
    io::stdout().flush()
}

/// Answer one question. A failed question is reported and the session stays usable.
fn answer_one(
    vellum: &Vellum,
    question: &str,
    options: AskOptions,
    previous: &mut Option<Answer>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = match previous.as_ref() {
        Some(context) if options.follow_up => vellum.ask_follow_up(question, context),
        _ => vellum.ask(question),
    };
    match outcome {
        Ok(answer) => {
            println!("{}", "Query Response".bold().underline());
            println!("{}", answer.final_answer);
            if options.trace {
                println!("{}", "Intermediate Info".dimmed());
                println!("{}", serde_json::to_string_pretty(&answer.trace)?);
            }
            *previous = Some(answer);
        }
        Err(e) => eprintln!("{} {}", "✗".red().bold(), e),
    }
    println!();
    Ok(())
}
