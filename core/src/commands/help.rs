#[must_use]
pub fn help_text(command: Option<&str>) -> String {
    match command {
        Some("message") | Some("msg") | Some("read") => {
            "message\n  Show the message currently stored in the contract.\n  Kept up to date from UpdatedMessages events.\n  Aliases: msg, read".to_string()
        }
        Some("connect") => {
            "connect\n  Ask the wallet for access to your accounts.\n  The wallet may show an approval prompt.".to_string()
        }
        Some("address") | Some("addr") => {
            "address\n  Show the connected wallet address.\n  Alias: addr".to_string()
        }
        Some("status") => {
            "status\n  Show the current status line, message, draft and wallet.".to_string()
        }
        Some("update") | Some("set") => {
            "update <text>\n  Submit a transaction that stores a new message.\n  Requires a connected wallet. The message changes once the\n  transaction is mined and the UpdatedMessages event arrives.\n  Example: update Hello from the terminal\n  Alias: set".to_string()
        }
        Some("draft") => {
            "draft [text]\n  Set the draft message without submitting it.\n  Without text, clears the draft.".to_string()
        }
        Some("network") | Some("net") => {
            "network\n  Show the configured network, chain ID and contract address.\n  Alias: net".to_string()
        }
        Some("exit") | Some("quit") | Some("q") => {
            "exit\n  Leave the REPL.\n  Aliases: quit, q".to_string()
        }
        Some("help") | Some("h") | Some("?") => {
            "help [command]\n  Show all commands, or details for one.\n  Aliases: h, ?".to_string()
        }
        Some(other) => format!("Unknown command: '{other}'. Type 'help' for a list."),
        None => {
            "Available commands:\n\
             \n\
             \x20 message          Show the stored message\n\
             \x20 connect          Connect your wallet\n\
             \x20 address          Show the connected address\n\
             \x20 status           Show the current status\n\
             \x20 update <text>    Store a new message on-chain\n\
             \x20 draft [text]     Set or clear the draft message\n\
             \x20 network          Show network details\n\
             \x20 help [cmd]       Show help for a command\n\
             \x20 exit             Exit\n\
             \n\
             Type 'help <command>' for detailed help on a specific command."
                .to_string()
        }
    }
}
