//! Command parsing for the interactive client shell.
//!
//! Commands are case-insensitive and every command has a one-letter alias.

use anyhow::{Result, anyhow};

pub const HELP_LINES: &[&str] = &[
    "Commands (case-insensitive):",
    "  WRITE <item> <content...>  (alias: w)  -- write through a random node",
    "  READ <item>                (alias: r)  -- read from the last node written to",
    "  SESSION                    (alias: s)  -- show session state",
    "  HELP                       (alias: h)  -- show this message",
    "  EXIT                       (alias: e)  -- leave the shell",
];

#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    Write { item_id: String, content: String },
    Read { item_id: String },
    Session,
    Help,
    Exit,
}

impl ConsoleCommand {
    /// Parses one line of shell input.
    ///
    /// Everything after the item id in `WRITE` is the content, internal
    /// whitespace included.
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let Some((first, rest)) = split_word(trimmed) else {
            return Err(anyhow!("empty command"));
        };

        let cmd = first.to_uppercase();
        let normalized_cmd = match cmd.as_str() {
            "W" => "WRITE",
            "R" => "READ",
            "S" => "SESSION",
            "H" => "HELP",
            "E" => "EXIT",
            other => other,
        };

        match normalized_cmd {
            "EXIT" => return Ok(ConsoleCommand::Exit),
            "HELP" => return Ok(ConsoleCommand::Help),
            "SESSION" => return Ok(ConsoleCommand::Session),
            _ => {}
        }

        match (normalized_cmd, split_word(rest)) {
            ("READ", Some((item_id, tail))) if tail.is_empty() => Ok(ConsoleCommand::Read {
                item_id: item_id.to_string(),
            }),
            ("READ", _) => Err(anyhow!("READ requires exactly one argument: READ <item>")),
            ("WRITE", Some((item_id, content))) if !content.is_empty() => {
                Ok(ConsoleCommand::Write {
                    item_id: item_id.to_string(),
                    content: content.to_string(),
                })
            }
            ("WRITE", _) => Err(anyhow!("WRITE requires an item and content: WRITE <item> <content>")),
            _ => Err(anyhow!(
                "invalid command. Try: WRITE/w <item> <content>, READ/r <item>, SESSION/s, HELP/h, EXIT/e"
            )),
        }
    }
}

/// Splits off the first whitespace-separated word, trimming the remainder.
fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => Some((word, rest.trim())),
        None => Some((input, "")),
    }
}
