//! Interpretation of one line typed into the timer prompt.
//!
//! Window commands (`exit`, `min`, trailing `-`) are presentation concerns;
//! everything else is handed to the core parser untouched.

use lazytimer_core::TRAILING_MARKER;

const EXIT_COMMAND: &str = "exit";
const MINIMIZE_COMMAND: &str = "min";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCommand {
    /// Blank line; just refresh the table.
    Refresh,
    Exit,
    Minimize,
    CreateTimer {
        input: String,
        minimize_after: bool,
    },
}

pub fn classify(line: &str) -> EntryCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return EntryCommand::Refresh;
    }
    if trimmed.eq_ignore_ascii_case(EXIT_COMMAND) {
        return EntryCommand::Exit;
    }
    if trimmed.eq_ignore_ascii_case(MINIMIZE_COMMAND) {
        return EntryCommand::Minimize;
    }

    match trimmed.strip_suffix(TRAILING_MARKER) {
        Some(rest) if rest.trim().is_empty() => EntryCommand::Minimize,
        Some(rest) => EntryCommand::CreateTimer {
            input: rest.to_string(),
            minimize_after: true,
        },
        None => EntryCommand::CreateTimer {
            input: trimmed.to_string(),
            minimize_after: false,
        },
    }
}
