//! The connection lifecycle: bootstrap, wallet tracking, contract event
//! subscription and the update write path, all publishing into one
//! observable [`SessionState`].

mod bootstrap;
mod events;
mod tracker;
mod write;

pub use tracker::WalletConnection;
pub use write::submit_update;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::debug;

use crate::config::DappConfig;
use crate::contract::ContractHandle;
use crate::provider::{NetworkAccess, WalletExtension};
use crate::status::Status;

use events::MessageSubscriber;
use tracker::WalletTracker;

/// Shown until the first successful contract read.
pub const NO_CONNECTION_MESSAGE: &str = "No connection to the network.";

pub(crate) type StateTx = Arc<watch::Sender<SessionState>>;

/// Everything a rendering surface displays.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: Status,
    /// Set iff the wallet reports at least one authorized account.
    pub wallet_address: Option<Address>,
    pub current_message: String,
    /// Pending user input; cleared when an update event is observed.
    pub draft_message: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            wallet_address: None,
            current_message: NO_CONNECTION_MESSAGE.to_string(),
            draft_message: String::new(),
        }
    }
}

impl SessionState {
    /// Checksummed address, or an empty string without a wallet.
    pub fn wallet_address_string(&self) -> String {
        self.wallet_address
            .map(|a| a.to_checksum(None))
            .unwrap_or_default()
    }
}

pub struct Session {
    config: Arc<DappConfig>,
    network: Arc<dyn NetworkAccess>,
    tracker: WalletTracker,
    subscriber: MessageSubscriber,
    contract: Mutex<Option<ContractHandle>>,
    state: StateTx,
    bootstrapped: AtomicBool,
}

impl Session {
    /// `wallet` is `None` when no wallet extension is available.
    pub fn new(
        config: DappConfig,
        network: Arc<dyn NetworkAccess>,
        wallet: Option<Arc<dyn WalletExtension>>,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            config: Arc::new(config),
            network,
            tracker: WalletTracker::new(wallet),
            subscriber: MessageSubscriber::new(),
            contract: Mutex::new(None),
            state: Arc::new(tx),
            bootstrapped: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &DappConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.draft_message = text);
    }

    pub fn contract(&self) -> Option<ContractHandle> {
        lock(&self.contract).clone()
    }

    /// Swap the contract handle. The old event listener is torn down before
    /// the new one is installed; the same handle again is a no-op.
    ///
    /// The slot lock is held across the swap so the stored handle and the
    /// listening one never disagree.
    pub fn replace_contract(&self, handle: ContractHandle) {
        let mut slot = lock(&self.contract);
        self.subscriber.attach(&handle, self.state.clone());
        *slot = Some(handle);
    }

    /// Whether an `UpdatedMessages` listener is currently installed.
    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_subscribed()
    }

    /// Tear down every listener. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        debug!("session shutdown");
        self.subscriber.detach();
        self.tracker.teardown();
    }

    pub(crate) fn set_status(&self, status: Status) {
        self.state.send_modify(|s| s.status = status);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Poisoning only happens if a listener panicked mid-update; the data is
/// still a plain value, so keep going.
pub(crate) fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests;
