//! The shell's finite command vocabulary.

/// Words that end the session, compared case-insensitively.
pub const EXIT_TOKENS: [&str; 4] = ["esci", "exit", "quit", "stop"];

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    /// Blank line; nothing to do.
    Empty,
    /// Free text for the resolver.
    Query(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Command::Empty
        } else if EXIT_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
            Command::Exit
        } else {
            Command::Query(trimmed.to_string())
        }
    }
}
