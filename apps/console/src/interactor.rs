//! # User Interaction
//!
//! The prompt/read/show boundary. Sessions never touch stdin or stdout
//! directly; they go through a [`UserInteractor`].
//!
//! ```text
//! ┌──────────────────┐   show / prompt    ┌─────────────────────────────┐
//! │  Session logic   │ ─────────────────► │ ConsoleInteractor (stdio)   │
//! │  customer/vendor │ ◄───────────────── │ ScriptedInteractor (tests)  │
//! └──────────────────┘     read_line      └─────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Source of user input and sink for messages.
pub trait UserInteractor {
    /// Next line of input without its line ending, or `None` once input is
    /// exhausted.
    fn read_line(&mut self) -> Option<String>;

    /// Shows a message to the user.
    fn show(&mut self, message: &str);

    /// Shows `message` and reads the trimmed answer.
    fn prompt(&mut self, message: &str) -> Option<String> {
        self.show(message);
        self.read_line().map(|line| line.trim().to_string())
    }

    /// Asks a yes/no question until answered. End of input counts as no.
    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let Some(answer) = self.prompt(&format!("{} (y/n)", question)) else {
                return false;
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.show("Please answer y or n."),
            }
        }
    }
}

// =============================================================================
// Console
// =============================================================================

/// Reads stdin, writes stdout.
#[derive(Debug, Default)]
pub struct ConsoleInteractor;

impl ConsoleInteractor {
    pub fn new() -> Self {
        ConsoleInteractor
    }
}

impl UserInteractor for ConsoleInteractor {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                None
            }
        }
    }

    fn show(&mut self, message: &str) {
        let mut out = io::stdout().lock();
        // A closed stdout ends the session at the next read
        let _ = writeln!(out, "{}", message);
        let _ = out.flush();
    }
}

// =============================================================================
// Scripted
// =============================================================================

/// Plays back a fixed list of input lines and records every message.
#[derive(Debug, Default)]
pub struct ScriptedInteractor {
    input: VecDeque<String>,
    output: Vec<String>,
}

impl ScriptedInteractor {
    pub fn new<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Self {
        ScriptedInteractor {
            input: lines.into_iter().map(|l| l.as_ref().to_string()).collect(),
            output: Vec::new(),
        }
    }

    /// Everything shown so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Output joined with newlines.
    pub fn transcript(&self) -> String {
        self.output.join("\n")
    }

    /// True if any message contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.output.iter().any(|m| m.contains(needle))
    }

    /// Input lines not consumed.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl UserInteractor for ScriptedInteractor {
    fn read_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }

    fn show(&mut self, message: &str) {
        self.output.push(message.to_string());
    }
}
