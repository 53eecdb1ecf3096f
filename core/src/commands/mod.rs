/// Command definitions and parsing for the dApp REPL and one-shot mode.
mod execute;
mod help;
mod parse;

pub use help::help_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the stored message
    Message,
    /// Ask the wallet for account access
    Connect,
    /// Show the connected wallet address
    Address,
    /// Show the current status line
    Status,
    /// Set the draft and submit it: update <text>
    Update { text: String },
    /// Set the draft without submitting: draft <text>
    Draft { text: String },
    /// Show network and contract details
    Network,
    /// Print help
    Help { command: Option<String> },
    /// Exit the REPL
    Exit,
}

impl Command {
    /// Hint printed while the command waits on the wallet.
    pub fn pending_hint(&self) -> Option<&'static str> {
        match self {
            Command::Connect => Some("Waiting for the wallet to approve account access..."),
            Command::Update { .. } => Some("Waiting for the wallet to approve the transaction..."),
            _ => None,
        }
    }
}
