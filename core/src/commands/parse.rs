use anyhow::{bail, Result};

use super::Command;

impl Command {
    /// Parse a command from a raw input string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("No command entered. Type 'help' for a list of commands.");
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), Some(rest.trim())),
            None => (input.to_lowercase(), None),
        };
        let rest = rest.filter(|s| !s.is_empty());

        match cmd.as_str() {
            "message" | "msg" | "read" => Ok(Command::Message),

            "connect" => Ok(Command::Connect),

            "address" | "addr" => Ok(Command::Address),

            "status" => Ok(Command::Status),

            "update" | "set" => {
                let text = rest.ok_or_else(|| {
                    anyhow::anyhow!("Missing message. Usage: update <text>")
                })?;
                Ok(Command::Update {
                    text: unquote(text).to_string(),
                })
            }

            "draft" => Ok(Command::Draft {
                text: rest.map(unquote).unwrap_or_default().to_string(),
            }),

            "network" | "net" => Ok(Command::Network),

            "help" | "h" | "?" => Ok(Command::Help {
                command: rest.map(|s| s.to_lowercase()),
            }),

            "exit" | "quit" | "q" => Ok(Command::Exit),

            other => bail!("Unknown command: '{other}'. Type 'help' for a list of commands."),
        }
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}
