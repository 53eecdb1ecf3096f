/// Wallet session tracking: connect requests, the passive `accountsChanged`
/// listener, and the account-list reducer both share.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::Address;
use tracing::{debug, info, warn};

use super::{lock, SessionState, StateTx};
use crate::error::{with_timeout, DappError};
use crate::provider::WalletExtension;
use crate::status::Status;
use crate::subscription::Subscription;

/// Outcome of a wallet query or connect request.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletConnection {
    pub address: Option<Address>,
    pub status: Status,
}

impl WalletConnection {
    fn from_accounts(accounts: &[Address]) -> Self {
        match accounts.first() {
            Some(first) => Self {
                address: Some(*first),
                status: Status::WritePrompt,
            },
            None => Self {
                address: None,
                status: Status::ConnectPrompt,
            },
        }
    }

    fn from_error(err: &DappError) -> Self {
        Self {
            address: None,
            status: Status::from(err),
        }
    }

    fn no_wallet() -> Self {
        Self {
            address: None,
            status: Status::InstallWallet,
        }
    }
}

/// Fold one `accountsChanged` notification into the session state.
pub(crate) fn apply_accounts(state: &mut SessionState, accounts: &[Address]) {
    let connection = WalletConnection::from_accounts(accounts);
    state.wallet_address = connection.address;
    state.status = connection.status;
}

pub(crate) struct WalletTracker {
    wallet: Option<Arc<dyn WalletExtension>>,
    listener: Mutex<Option<Subscription>>,
}

impl WalletTracker {
    pub(crate) fn new(wallet: Option<Arc<dyn WalletExtension>>) -> Self {
        Self {
            wallet,
            listener: Mutex::new(None),
        }
    }

    pub(crate) fn wallet(&self) -> Option<&Arc<dyn WalletExtension>> {
        self.wallet.as_ref()
    }

    /// Already-authorized account, without prompting the user.
    pub(crate) async fn current(&self, limit: Duration) -> WalletConnection {
        let Some(wallet) = &self.wallet else {
            return WalletConnection::no_wallet();
        };
        let accounts = with_timeout(Some(limit), "authorized accounts", wallet.authorized_accounts());
        match accounts.await {
            Ok(accounts) => WalletConnection::from_accounts(&accounts),
            Err(e) => {
                warn!("failed to query authorized accounts: {e}");
                WalletConnection::from_error(&e)
            }
        }
    }

    /// Ask the wallet to authorize an account.
    pub(crate) async fn connect(&self, timeout: Option<Duration>) -> WalletConnection {
        let Some(wallet) = &self.wallet else {
            return WalletConnection::no_wallet();
        };
        match with_timeout(timeout, "account approval", wallet.request_accounts()).await {
            Ok(accounts) if accounts.is_empty() => {
                // An approval that grants nothing is a refusal.
                WalletConnection::from_error(&DappError::WalletRejected(
                    "No account was authorized.".into(),
                ))
            }
            Ok(accounts) => {
                info!(address = %accounts[0], "wallet connected");
                WalletConnection::from_accounts(&accounts)
            }
            Err(e) => {
                warn!("wallet connect failed: {e}");
                WalletConnection::from_error(&e)
            }
        }
    }

    /// Register the `accountsChanged` listener. Returns `false` when one is
    /// already installed or there is no wallet.
    pub(crate) fn install_listener(&self, state: StateTx) -> bool {
        let Some(wallet) = &self.wallet else {
            return false;
        };
        let mut slot = lock(&self.listener);
        if slot.is_some() {
            debug!("accountsChanged listener already installed");
            return false;
        }
        *slot = Some(wallet.on_accounts_changed(Arc::new(move |accounts: Vec<Address>| {
            debug!(count = accounts.len(), "accountsChanged");
            state.send_modify(|s| apply_accounts(s, &accounts));
        })));
        true
    }

    pub(crate) fn teardown(&self) {
        if let Some(subscription) = lock(&self.listener).take() {
            subscription.unsubscribe();
        }
    }
}
