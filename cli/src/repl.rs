use crate::Cli;
/// REPL shell: Reedline-based interactive dApp session.
use anyhow::{Context, Result};
use hello_dapp_core::commands::Command;
use hello_dapp_core::display;
use hello_dapp_core::{SessionState, Status};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal,
};
use tracing::warn;

const HISTORY_SIZE: usize = 500;

pub async fn run_repl(cli: &Cli) -> Result<()> {
    println!("HelloWorld dApp v{}", env!("CARGO_PKG_VERSION"));
    if cli.demo {
        println!("Network: demo (in-process chain)");
    } else {
        println!("Network: {}", cli.dapp_config()?.network.network);
    }
    println!();

    let session = cli.open_session().await?;
    session.bootstrap().await;

    let mut seen = session.snapshot();
    println!("Message: {}", seen.current_message);
    println!("{}", seen.status);
    println!("Type 'help' for a list of commands.");
    println!();

    let commands: Vec<String> = vec![
        "message".into(),
        "msg".into(),
        "read".into(),
        "connect".into(),
        "address".into(),
        "addr".into(),
        "status".into(),
        "update".into(),
        "set".into(),
        "draft".into(),
        "network".into(),
        "net".into(),
        "help".into(),
        "exit".into(),
        "quit".into(),
        "q".into(),
    ];
    let completer = Box::new(DefaultCompleter::new(commands));
    let mut line_editor = Reedline::create().with_completer(completer);
    match history() {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => warn!("REPL history disabled: {e}"),
    }

    loop {
        report_changes(&mut seen, session.snapshot());
        let prompt = prompt_for(&seen);

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match Command::parse(line) {
                    Ok(Command::Exit) => {
                        println!("Goodbye.");
                        break;
                    }
                    Ok(cmd) => {
                        if let Some(hint) = cmd.pending_hint() {
                            println!("{hint}");
                        }
                        match cmd.execute(&session, false).await {
                            Ok(output) => {
                                if !output.is_empty() {
                                    println!("{output}");
                                }
                            }
                            Err(e) => {
                                eprintln!("Error: {e}");
                            }
                        }
                        // Outcomes of the command itself were just printed.
                        seen = session.snapshot();
                    }
                    Err(e) => {
                        eprintln!("{e}");
                    }
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                println!("Goodbye.");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn history() -> Result<FileBackedHistory> {
    let dir = hello_dapp_core::data_dir()?;
    std::fs::create_dir_all(&dir).context("Failed to create data directory")?;
    FileBackedHistory::with_file(HISTORY_SIZE, dir.join("history.txt"))
        .context("Failed to open REPL history")
}

fn prompt_for(state: &SessionState) -> DefaultPrompt {
    let label = match &state.wallet_address {
        Some(address) => format!("[hello-dapp {}]", display::short_address(address)),
        None => "[hello-dapp]".to_string(),
    };
    DefaultPrompt::new(
        DefaultPromptSegment::Basic(label),
        DefaultPromptSegment::Empty,
    )
}

/// Print what changed in the background (events, account switches) since
/// the last prompt.
fn report_changes(seen: &mut SessionState, now: SessionState) {
    if now.current_message != seen.current_message {
        println!("Message: {}", now.current_message);
    }
    if now.wallet_address != seen.wallet_address {
        match &now.wallet_address {
            Some(address) => println!("Wallet account: {}", address.to_checksum(None)),
            None => println!("Wallet disconnected."),
        }
    }
    if now.status != seen.status && now.status != Status::Idle {
        println!("{}", now.status);
    }
    *seen = now;
}

