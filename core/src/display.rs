/// Output formatting: address shortening and the JSON shapes used by `--json`.
use alloy_primitives::Address;

use crate::config::DappConfig;
use crate::session::SessionState;
use crate::status::{Status, StatusKind};

/// `0x1234...5678`: first six and last four characters of the checksummed address.
#[must_use]
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Label for the connect button.
#[must_use]
pub fn wallet_button_label(address: Option<&Address>) -> String {
    match address {
        Some(addr) => format!("Connected: {}", short_address(addr)),
        None => "Connect Wallet".to_string(),
    }
}

fn kind_name(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Disconnected => "disconnected",
        StatusKind::Connected => "connected",
        StatusKind::Prompt => "prompt",
        StatusKind::Pending => "pending",
        StatusKind::Success => "success",
        StatusKind::Error => "error",
    }
}

#[must_use]
pub fn format_status_json(status: &Status) -> String {
    let mut value = serde_json::json!({
        "kind": kind_name(status.kind()),
        "status": status.to_string(),
    });
    if let Status::Submitted {
        tx_hash,
        explorer_url,
    } = status
    {
        value["tx_hash"] = serde_json::json!(tx_hash);
        value["explorer_url"] = serde_json::json!(explorer_url);
    }
    value.to_string()
}

#[must_use]
pub fn format_state_json(state: &SessionState) -> String {
    serde_json::json!({
        "message": state.current_message,
        "wallet": state.wallet_address_string(),
        "draft": state.draft_message,
        "kind": kind_name(state.status.kind()),
        "status": state.status.to_string(),
    })
    .to_string()
}

/// Configured network plus what the node reports, if it was reachable.
#[must_use]
pub fn format_network(config: &DappConfig, live_chain_id: Option<u64>) -> String {
    let node = match live_chain_id {
        Some(id) => format!("reachable (chain {id})"),
        None => "not connected".to_string(),
    };
    let expected = config
        .network
        .network
        .chain_id()
        .map_or_else(|| "any".to_string(), |id| id.to_string());
    format!(
        "Network:  {}\nChain ID: {}\nContract: {}\nNode:     {}",
        config.network.network,
        expected,
        config.contract_address.to_checksum(None),
        node
    )
}

#[must_use]
pub fn format_network_json(config: &DappConfig, live_chain_id: Option<u64>) -> String {
    serde_json::json!({
        "network": config.network.network.to_string(),
        "chain_id": config.network.network.chain_id(),
        "contract": config.contract_address.to_checksum(None),
        "node_chain_id": live_chain_id,
    })
    .to_string()
}
