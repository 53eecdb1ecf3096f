//! Collaborator traits: the network access layer, the read provider and the
//! wallet extension. The session only ever sees these; concrete JSON-RPC
//! adapters live in [`crate::network`] and [`crate::wallet`].

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;

use crate::error::Result;
use crate::subscription::Subscription;

pub use alloy_rpc_types_eth::{Filter, Log, TransactionRequest};

/// Whether `log` passes `filter`'s address and topic sets. Block bounds are
/// not checked.
pub fn log_matches(filter: &Filter, log: &Log) -> bool {
    if !filter.address.matches(&log.address()) {
        return false;
    }
    let topics = log.topics();
    filter
        .topics
        .iter()
        .enumerate()
        .all(|(i, wanted)| match topics.get(i) {
            Some(topic) => wanted.matches(topic),
            None => wanted.is_empty(),
        })
}

pub type LogListener = Arc<dyn Fn(Result<Log>) + Send + Sync>;
pub type AccountsListener = Arc<dyn Fn(Vec<Address>) + Send + Sync>;

/// Read-only access to chain state. No signing capability.
#[async_trait]
pub trait ReadProvider: Send + Sync {
    /// Execute a read-only call against `to` and return the raw return data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn chain_id(&self) -> Result<u64>;

    /// Deliver every future log matching `filter` to `listener` until the
    /// returned subscription is dropped.
    fn watch_logs(&self, filter: Filter, listener: LogListener) -> Subscription;
}

/// Supplies a read provider for the configured network.
#[async_trait]
pub trait NetworkAccess: Send + Sync {
    async fn provider(&self) -> Result<Arc<dyn ReadProvider>>;
}

/// The key-holding agent that authorizes accounts and signs transactions.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Ask the user to authorize accounts. May wait on the wallet's own UI.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Accounts already authorized for this origin, without prompting.
    async fn authorized_accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    /// Sign and broadcast `tx`, returning its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;

    /// Deliver account-change notifications until the subscription is dropped.
    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription;
}
