use anyhow::{bail, Result};

use super::help::help_text;
use super::Command;
use crate::display;
use crate::session::Session;
use crate::status::{Status, StatusKind};

impl Command {
    /// Execute a command against the session and return the output string.
    /// Statuses that mean the action did not happen are returned as errors.
    pub async fn execute(&self, session: &Session, json_output: bool) -> Result<String> {
        match self {
            Command::Message => {
                let state = session.snapshot();
                if json_output {
                    Ok(serde_json::json!({ "message": state.current_message }).to_string())
                } else {
                    Ok(state.current_message)
                }
            }

            Command::Connect => {
                let connection = session.connect_wallet().await;
                let Some(address) = connection.address else {
                    bail!("{}", connection.status);
                };
                if json_output {
                    Ok(serde_json::json!({
                        "address": address.to_checksum(None),
                        "status": connection.status.to_string(),
                    })
                    .to_string())
                } else {
                    Ok(format!(
                        "{}\n{}",
                        display::wallet_button_label(Some(&address)),
                        connection.status
                    ))
                }
            }

            Command::Address => {
                let address = session.snapshot().wallet_address_string();
                if json_output {
                    Ok(serde_json::json!({ "address": address }).to_string())
                } else if address.is_empty() {
                    Ok("No wallet connected. Type 'connect' first.".to_string())
                } else {
                    Ok(address)
                }
            }

            Command::Status => {
                let state = session.snapshot();
                if json_output {
                    return Ok(display::format_state_json(&state));
                }
                let wallet = state
                    .wallet_address
                    .as_ref()
                    .map_or_else(|| "not connected".to_string(), display::short_address);
                let mut out = format!(
                    "Message: {}\nDraft:   {}\nWallet:  {}\nStatus:  {}",
                    state.current_message, state.draft_message, wallet, state.status
                );
                if let Some(link) = state.status.link() {
                    out.push_str(&format!("\n         {link}"));
                }
                Ok(out)
            }

            Command::Update { text } => {
                session.set_draft(text.as_str());
                let status = session.submit().await;
                status_output(&status, json_output)
            }

            Command::Draft { text } => {
                session.set_draft(text.as_str());
                if json_output {
                    Ok(serde_json::json!({ "draft": text }).to_string())
                } else if text.is_empty() {
                    Ok("Draft cleared.".to_string())
                } else {
                    Ok(format!("Draft set to \"{text}\"."))
                }
            }

            Command::Network => {
                let live_chain_id = match session.contract() {
                    Some(handle) => handle.provider().chain_id().await.ok(),
                    None => None,
                };
                if json_output {
                    Ok(display::format_network_json(session.config(), live_chain_id))
                } else {
                    Ok(display::format_network(session.config(), live_chain_id))
                }
            }

            Command::Help { command } => Ok(help_text(command.as_deref())),

            // Handled directly in the REPL loop
            Command::Exit => Ok(String::new()),
        }
    }
}

fn status_output(status: &Status, json_output: bool) -> Result<String> {
    match status.kind() {
        StatusKind::Error | StatusKind::Prompt => bail!("{status}"),
        _ if json_output => Ok(display::format_status_json(status)),
        _ => match status.link() {
            Some(link) => Ok(format!("{status}\n{link}")),
            None => Ok(status.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::{address, Address};

    use super::*;
    use crate::config::DappConfig;
    use crate::memory::{MemoryChain, MemoryWallet};

    const CONTRACT: Address = address!("6f3f635A9762B47954229Ea479b4541eAF402A6A");
    const ALICE: Address = address!("1234000000000000000000000000000000005678");

    async fn session() -> (MemoryChain, Session) {
        let chain = MemoryChain::new(CONTRACT, 5, "Hello World");
        let wallet = MemoryWallet::new(chain.clone(), vec![ALICE]);
        let config = DappConfig {
            contract_address: CONTRACT,
            ..DappConfig::default()
        };
        let session = Session::new(config, Arc::new(chain.clone()), Some(Arc::new(wallet)));
        session.bootstrap().await;
        (chain, session)
    }

    #[tokio::test]
    async fn message_reads_current_state() {
        let (_chain, session) = session().await;
        let out = Command::Message.execute(&session, false).await.unwrap();
        assert_eq!(out, "Hello World");

        let json = Command::Message.execute(&session, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message"], "Hello World");
    }

    #[tokio::test]
    async fn address_before_and_after_connect() {
        let (_chain, session) = session().await;
        let out = Command::Address.execute(&session, false).await.unwrap();
        assert!(out.contains("No wallet connected"));

        let out = Command::Connect.execute(&session, false).await.unwrap();
        assert!(out.contains("0x1234...5678"));

        let out = Command::Address.execute(&session, false).await.unwrap();
        assert_eq!(out, "0x1234000000000000000000000000000000005678");
    }

    #[tokio::test]
    async fn update_without_wallet_is_an_error() {
        let (_chain, session) = session().await;
        let err = Command::Update { text: "Hi".into() }
            .execute(&session, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Connect your Metamask wallet"));
    }

    #[tokio::test]
    async fn update_reports_submitted_transaction() {
        let (chain, session) = session().await;
        Command::Connect.execute(&session, false).await.unwrap();

        let json = Command::Update { text: "Hi".into() }
            .execute(&session, true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "success");
        assert!(value["explorer_url"]
            .as_str()
            .unwrap()
            .starts_with("https://goerli.etherscan.io/tx/0x"));

        assert_eq!(chain.mine(), 1);
        let out = Command::Message.execute(&session, false).await.unwrap();
        assert_eq!(out, "Hi");
    }

    #[tokio::test]
    async fn draft_and_status() {
        let (_chain, session) = session().await;
        let out = Command::Draft { text: "gm".into() }
            .execute(&session, false)
            .await
            .unwrap();
        assert!(out.contains("gm"));

        let out = Command::Status.execute(&session, false).await.unwrap();
        assert!(out.contains("Draft:   gm"));
        assert!(out.contains("Wallet:  not connected"));
    }

    #[tokio::test]
    async fn network_reports_live_chain() {
        let (_chain, session) = session().await;
        let out = Command::Network.execute(&session, false).await.unwrap();
        assert!(out.contains("reachable (chain 5)"));
        assert!(out.contains("0x6f3f635A9762B47954229Ea479b4541eAF402A6A"));
    }
}
