//! In-process chain and wallet. Drives the `--demo` mode of the front-ends
//! and stands in for a node and a wallet extension in tests.
//!
//! Submitted updates queue as pending until [`MemoryChain::mine`] runs, so the
//! gap between "wallet accepted" and "event observed" is visible here too.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{address, keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use tracing::debug;

use crate::config::DappConfig;
use crate::contract::{decode_update_calldata, encode_message_return, encode_updated, is_message_call};
use crate::error::{DappError, Result};
use crate::provider::{
    log_matches, AccountsListener, Filter, Log, LogListener, NetworkAccess, ReadProvider,
    TransactionRequest, WalletExtension,
};
use crate::session::lock;
use crate::subscription::Subscription;

struct PendingUpdate {
    message: String,
    hash: B256,
}

struct ChainState {
    message: String,
    block: u64,
    nonce: u64,
    pending: Vec<PendingUpdate>,
    next_listener: u64,
    listeners: Vec<(u64, Filter, LogListener)>,
    provider_failure: Option<String>,
    read_failure: Option<String>,
}

/// A single-contract chain holding the HelloWorld message.
#[derive(Clone)]
pub struct MemoryChain {
    contract: Address,
    chain_id: u64,
    state: Arc<Mutex<ChainState>>,
}

impl MemoryChain {
    pub fn new(contract: Address, chain_id: u64, message: impl Into<String>) -> Self {
        Self {
            contract,
            chain_id,
            state: Arc::new(Mutex::new(ChainState {
                message: message.into(),
                block: 0,
                nonce: 0,
                pending: Vec::new(),
                next_listener: 0,
                listeners: Vec::new(),
                provider_failure: None,
                read_failure: None,
            })),
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn message(&self) -> String {
        lock(&self.state).message.clone()
    }

    /// Make provider acquisition fail with `reason`.
    pub fn fail_provider(&self, reason: impl Into<String>) {
        lock(&self.state).provider_failure = Some(reason.into());
    }

    /// Make `message()` calls fail with `reason`.
    pub fn fail_reads(&self, reason: impl Into<String>) {
        lock(&self.state).read_failure = Some(reason.into());
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Queue an update as if a signed transaction reached the mempool.
    pub fn queue_update(&self, from: Address, message: String) -> B256 {
        let mut state = lock(&self.state);
        state.nonce += 1;
        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&state.nonce.to_be_bytes());
        preimage.extend_from_slice(message.as_bytes());
        let hash = keccak256(&preimage);
        state.pending.push(PendingUpdate { message, hash });
        hash
    }

    /// Apply all pending updates in one block and emit their events.
    /// Returns the number of updates applied.
    pub fn mine(&self) -> usize {
        let (logs, listeners) = {
            let mut state = lock(&self.state);
            if state.pending.is_empty() {
                return 0;
            }
            state.block += 1;
            let block = state.block;
            let mut logs = Vec::new();
            for update in std::mem::take(&mut state.pending) {
                let mut log = encode_updated(self.contract, &state.message, &update.message);
                log.block_number = Some(block);
                log.transaction_hash = Some(update.hash);
                state.message = update.message;
                logs.push(log);
            }
            let listeners: Vec<_> = state
                .listeners
                .iter()
                .map(|(_, filter, listener)| (filter.clone(), listener.clone()))
                .collect();
            (logs, listeners)
        };
        debug!(count = logs.len(), "mined pending updates");
        let applied = logs.len();
        for log in logs {
            self.deliver(&listeners, log);
        }
        applied
    }

    /// Deliver an arbitrary log to matching listeners.
    pub fn emit(&self, log: Log) {
        let listeners: Vec<_> = lock(&self.state)
            .listeners
            .iter()
            .map(|(_, filter, listener)| (filter.clone(), listener.clone()))
            .collect();
        self.deliver(&listeners, log);
    }

    // Listeners run outside the lock so they may call back into the chain.
    fn deliver(&self, listeners: &[(Filter, LogListener)], log: Log) {
        for (filter, listener) in listeners {
            if log_matches(filter, &log) {
                listener(Ok(log.clone()));
            }
        }
    }
}

#[async_trait]
impl NetworkAccess for MemoryChain {
    async fn provider(&self) -> Result<Arc<dyn ReadProvider>> {
        if let Some(reason) = lock(&self.state).provider_failure.clone() {
            return Err(DappError::Provider(reason));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ReadProvider for MemoryChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let state = lock(&self.state);
        if let Some(reason) = &state.read_failure {
            return Err(DappError::Rpc {
                code: -32000,
                message: reason.clone(),
            });
        }
        if to != self.contract || !is_message_call(&data) {
            return Err(DappError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }
        Ok(encode_message_return(&state.message))
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    fn watch_logs(&self, filter: Filter, listener: LogListener) -> Subscription {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push((id, filter, listener));
            id
        };
        let state = self.state.clone();
        Subscription::new(move || {
            lock(&state).listeners.retain(|(lid, _, _)| *lid != id);
        })
    }
}

/// How the next `eth_sendTransaction` should fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SendFailure {
    Rejected,
    InsufficientFunds,
    Reverted(String),
    /// Never answer, as a wallet left waiting on the user would.
    Stall,
}

struct WalletState {
    accounts: Vec<Address>,
    authorized: bool,
    reject_requests: bool,
    chain_id: u64,
    send_failure: Option<SendFailure>,
    sent: Vec<TransactionRequest>,
    next_listener: u64,
    listeners: Vec<(u64, AccountsListener)>,
}

/// Wallet holding a fixed set of accounts, submitting to a [`MemoryChain`].
#[derive(Clone)]
pub struct MemoryWallet {
    chain: MemoryChain,
    automine: Option<Duration>,
    state: Arc<Mutex<WalletState>>,
}

impl MemoryWallet {
    /// Accounts start unauthorized; `request_accounts` authorizes them.
    pub fn new(chain: MemoryChain, accounts: Vec<Address>) -> Self {
        let chain_id = chain.chain_id;
        Self {
            chain,
            automine: None,
            state: Arc::new(Mutex::new(WalletState {
                accounts,
                authorized: false,
                reject_requests: false,
                chain_id,
                send_failure: None,
                sent: Vec::new(),
                next_listener: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Mine each accepted transaction after `delay`.
    pub fn with_automine(mut self, delay: Duration) -> Self {
        self.automine = Some(delay);
        self
    }

    pub fn authorize(&self) {
        lock(&self.state).authorized = true;
    }

    pub fn reject_requests(&self, reject: bool) {
        lock(&self.state).reject_requests = reject;
    }

    pub fn switch_chain(&self, chain_id: u64) {
        lock(&self.state).chain_id = chain_id;
    }

    pub fn fail_next_send(&self, failure: SendFailure) {
        lock(&self.state).send_failure = Some(failure);
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        lock(&self.state).sent.clone()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    /// Replace the account list and notify listeners, as a wallet does when
    /// the user switches or disconnects accounts.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let listeners: Vec<AccountsListener> = {
            let mut state = lock(&self.state);
            state.accounts = accounts.clone();
            state.authorized = true;
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(accounts.clone());
        }
    }
}

/// First default account of a local anvil/hardhat node.
pub const DEMO_ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

const DEMO_CHAIN_ID: u64 = 31_337;
const DEMO_BLOCK_TIME: Duration = Duration::from_secs(3);

/// Chain and wallet backing `--demo`: the configured contract starts at
/// "Hello World" and accepted updates are mined a few seconds later.
pub fn demo(config: &DappConfig) -> (MemoryChain, MemoryWallet) {
    let chain_id = config.network.network.chain_id().unwrap_or(DEMO_CHAIN_ID);
    let chain = MemoryChain::new(config.contract_address, chain_id, "Hello World");
    let wallet =
        MemoryWallet::new(chain.clone(), vec![DEMO_ACCOUNT]).with_automine(DEMO_BLOCK_TIME);
    (chain, wallet)
}

#[async_trait]
impl WalletExtension for MemoryWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let mut state = lock(&self.state);
        if state.reject_requests {
            return Err(DappError::WalletRejected("User rejected the request.".into()));
        }
        state.authorized = true;
        Ok(state.accounts.clone())
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>> {
        let state = lock(&self.state);
        Ok(if state.authorized {
            state.accounts.clone()
        } else {
            Vec::new()
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(lock(&self.state).chain_id)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let failure = {
            let mut state = lock(&self.state);
            state.sent.push(tx.clone());
            state.send_failure.take()
        };
        match failure {
            Some(SendFailure::Rejected) => {
                return Err(DappError::WalletRejected("User denied transaction signature.".into()))
            }
            Some(SendFailure::InsufficientFunds) => {
                return Err(DappError::InsufficientFunds(
                    "insufficient funds for gas * price + value".into(),
                ))
            }
            Some(SendFailure::Reverted(reason)) => return Err(DappError::Transaction(reason)),
            Some(SendFailure::Stall) => std::future::pending::<()>().await,
            None => {}
        }
        if tx.to.as_ref().and_then(|kind| kind.to()) != Some(&self.chain.contract()) {
            return Err(DappError::Transaction("Unknown contract".into()));
        }
        let (Some(from), Some(data)) = (tx.from, tx.input.input()) else {
            return Err(DappError::Transaction("Missing sender or calldata".into()));
        };
        let message = decode_update_calldata(data)?;
        let hash = self.chain.queue_update(from, message);
        if let Some(delay) = self.automine {
            let chain = self.chain.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                chain.mine();
            });
        }
        Ok(hash)
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_listener;
            state.next_listener += 1;
            state.listeners.push((id, listener));
            id
        };
        let state = self.state.clone();
        Subscription::new(move || {
            lock(&state).listeners.retain(|(lid, _)| *lid != id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CONTRACT: Address = address!("6f3f635A9762B47954229Ea479b4541eAF402A6A");
    const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[tokio::test]
    async fn read_returns_stored_message() {
        let chain = MemoryChain::new(CONTRACT, 5, "Hello World");
        let handle = ContractHandle::new(CONTRACT, Arc::new(chain));
        assert_eq!(handle.read_message().await.unwrap(), "Hello World");
    }

    #[tokio::test]
    async fn updates_apply_only_when_mined() {
        let chain = MemoryChain::new(CONTRACT, 5, "Hello World");
        let wallet = MemoryWallet::new(chain.clone(), vec![ALICE]);
        let handle = ContractHandle::new(CONTRACT, Arc::new(chain.clone()));

        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let _sub = handle.watch_updates(Arc::new(move |_log: Result<Log>| {
            s.fetch_add(1, Ordering::SeqCst);
        }));

        wallet
            .send_transaction(handle.update_transaction(ALICE, "Hi"))
            .await
            .unwrap();
        assert_eq!(chain.message(), "Hello World");
        assert_eq!(chain.pending_count(), 1);

        assert_eq!(chain.mine(), 1);
        assert_eq!(chain.message(), "Hi");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let chain = MemoryChain::new(CONTRACT, 5, "");
        let sub = chain.watch_logs(
            Filter::new().address(CONTRACT),
            Arc::new(|_: Result<Log>| {}),
        );
        assert_eq!(chain.listener_count(), 1);
        drop(sub);
        assert_eq!(chain.listener_count(), 0);
    }

    #[tokio::test]
    async fn unauthorized_wallet_reports_no_accounts() {
        let wallet = MemoryWallet::new(MemoryChain::new(CONTRACT, 5, ""), vec![ALICE]);
        assert!(wallet.authorized_accounts().await.unwrap().is_empty());
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![ALICE]);
        assert_eq!(wallet.authorized_accounts().await.unwrap(), vec![ALICE]);
    }
}
