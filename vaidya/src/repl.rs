//! Line-oriented chat loop.
//!
//! Protocol:
//! - Lines starting with `#` are commands (facts, history, clear, help, quit)
//! - Every other non-empty line is sent to the assistant
//! - Replies are printed after a `[VAIDYA]` marker

use std::io::{self, BufRead, Write};
use vaidya_core::{ChatSession, CompletionProvider, KeyValueStore, Role};

const HELP: &str = "\
  #facts    - Show what has been learned about you
  #history  - Show the stored conversation
  #clear    - Forget the conversation and all learned facts
  #help     - Show this help
  #quit     - Exit";

/// A `#` command typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Facts,
    History,
    Clear,
    Help,
    Quit,
    Unknown,
}

impl Command {
    /// Parse a line; `None` when it is a chat message rather than a command.
    pub fn parse(line: &str) -> Option<Self> {
        let name = line.strip_prefix('#')?.split_whitespace().next().unwrap_or("");
        Some(match name.to_lowercase().as_str() {
            "facts" => Command::Facts,
            "history" => Command::History,
            "clear" => Command::Clear,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown,
        })
    }
}

/// Run the loop until `#quit` or end of input.
pub async fn run<S, P>(session: &mut ChatSession<S, P>) -> io::Result<()>
where
    S: KeyValueStore,
    P: CompletionProvider,
{
    println!("=== Vaidya ===");
    println!("Ask about diet, daily routine or balancing your doshas.");
    println!("{HELP}");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = Command::parse(line) {
            match command {
                Command::Quit => {
                    println!("Goodbye!");
                    break;
                }
                Command::Facts => {
                    let context = session.store().context_for_prompt();
                    if context.is_empty() {
                        println!("[FACTS] Nothing learned yet.");
                    } else {
                        println!("[FACTS]");
                        println!("{context}");
                    }
                }
                Command::History => {
                    println!("[HISTORY]");
                    for message in session.store().history() {
                        let label = match message.role {
                            Role::User => "You",
                            Role::Assistant => "Vaidya",
                            Role::System => "System",
                        };
                        println!("  {label}: {}", message.content);
                    }
                }
                Command::Clear => {
                    session.clear();
                    println!("[CLEARED] Conversation and learned facts forgotten.");
                }
                Command::Help => {
                    println!("[HELP]");
                    println!("{HELP}");
                    println!("  (anything else is sent as a message)");
                }
                Command::Unknown => {
                    println!("[ERROR] Unknown command. Type #help for help.");
                }
            }
            stdout.flush()?;
            continue;
        }

        print!("[THINKING]");
        stdout.flush()?;

        let reply = session.reply_or_fallback(line).await;

        // Clear the thinking indicator
        print!("\r          \r");
        println!("[VAIDYA]");
        for para in reply.split("\n\n") {
            println!("{para}");
        }
        println!();
        stdout.flush()?;
    }

    Ok(())
}
