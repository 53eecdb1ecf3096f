use std::path::PathBuf;

use anyhow::Context;

pub mod commands;
pub mod config;
pub mod contract;
pub mod display;
pub mod error;
pub mod memory;
pub mod network;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod status;
pub mod subscription;
pub mod wallet;

pub use commands::Command;
pub use config::{DappConfig, Network, NetworkConfig};
pub use contract::ContractHandle;
pub use error::DappError;
pub use network::{HttpNetwork, NetworkClient};
pub use provider::{NetworkAccess, ReadProvider, WalletExtension};
pub use session::{Session, SessionState, WalletConnection};
pub use status::{Status, StatusKind};
pub use subscription::Subscription;
pub use wallet::RpcWallet;

pub use alloy_primitives::Address;

/// XDG-compliant data directory for REPL history and local state.
/// Linux: `~/.local/share/hello-dapp/`, macOS: `~/Library/Application Support/hello-dapp/`
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Cannot determine data directory")?
        .join("hello-dapp");
    Ok(dir)
}
