//! Interactive chat loop with the agent team.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::commands::{Result, Session};
use crate::display;

const PROMPT: &str = "you> ";

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveCommand {
    Quit,
    Help,
    Memory,
    Summary,
    Empty,
    Query(String),
}

impl InteractiveCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Self::Empty,
            "quit" | "exit" | "q" => Self::Quit,
            "help" | "?" => Self::Help,
            "memory" => Self::Memory,
            "summary" => Self::Summary,
            _ => Self::Query(trimmed.to_string()),
        }
    }
}

fn print_help() {
    println!("Ask any health question, or use a command:");
    println!("  memory   show what the team remembers about you");
    println!("  summary  show a summary of this conversation");
    println!("  help     show this message");
    println!("  quit     leave (also: exit, q)");
}

/// Run the loop until the user quits or input ends.
///
/// A failed query prints an error and the loop continues.
pub fn run(runtime: &Runtime, session: &Session) -> Result<()> {
    let mut editor = DefaultEditor::new()?;

    display::heading("Interactive mode");
    print_help();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let command = InteractiveCommand::parse(&line);
                debug!(?command, "Parsed input");
                if command != InteractiveCommand::Empty {
                    editor.add_history_entry(line.as_str())?;
                }

                match command {
                    InteractiveCommand::Quit => break,
                    InteractiveCommand::Help => print_help(),
                    InteractiveCommand::Empty => {}
                    InteractiveCommand::Memory => {
                        display::print_memory(&runtime.block_on(session.orchestrator.memory()));
                    }
                    InteractiveCommand::Summary => {
                        display::print_summary(
                            &runtime.block_on(session.orchestrator.conversation_summary()),
                        );
                    }
                    InteractiveCommand::Query(query) => runtime.block_on(session.answer(&query)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
