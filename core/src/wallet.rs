/// EIP-1193 wallet reached over JSON-RPC (Frame and compatible desktop wallets).
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U64};
use alloy_rpc_client::RpcClient;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{validate_endpoint_url, DappConfig};
use crate::error::{DappError, Result};
use crate::provider::{AccountsListener, TransactionRequest, WalletExtension};
use crate::rpc::{http_client, request};
use crate::subscription::Subscription;

/// Consecutive unanswered polls after which the wallet counts as gone.
const ABSENT_POLLS_BEFORE_RESET: u32 = 3;

pub struct RpcWallet {
    client: RpcClient,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl RpcWallet {
    pub fn new(
        url: &str,
        allow_insecure: bool,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let url = validate_endpoint_url(url, allow_insecure)?;
        Ok(Self {
            client: http_client(url, request_timeout)?,
            poll_interval,
            request_timeout,
        })
    }

    pub fn from_config(config: &DappConfig) -> Result<Self> {
        Self::new(
            &config.wallet_url,
            config.allow_insecure,
            config.poll_interval,
            config.request_timeout,
        )
    }

    /// Probe the endpoint; `false` means no wallet is listening there.
    pub async fn is_available(&self) -> bool {
        self.chain_id().await.is_ok()
    }

    /// The configured wallet if something answers at its URL, else `None`.
    pub async fn detect(config: &DappConfig) -> Option<Arc<dyn WalletExtension>> {
        let wallet = match Self::from_config(config) {
            Ok(wallet) => wallet,
            Err(e) => {
                warn!("wallet URL rejected: {e}");
                return None;
            }
        };
        if wallet.is_available().await {
            info!(url = %config.wallet_url, "wallet detected");
            Some(Arc::new(wallet))
        } else {
            info!(url = %config.wallet_url, "no wallet listening");
            None
        }
    }
}

async fn accounts(client: &RpcClient, limit: Duration) -> Result<Vec<Address>> {
    request(client, "eth_accounts", serde_json::json!([]), Some(limit))
        .await
        .map_err(classify)
}

/// Map raw JSON-RPC failures onto the wallet error taxonomy.
fn classify(err: DappError) -> DappError {
    match err {
        DappError::RpcTransport(msg) => {
            debug!("wallet endpoint unreachable: {msg}");
            DappError::WalletAbsent
        }
        DappError::Rpc { code, message } if code == DappError::USER_REJECTED_CODE => {
            DappError::WalletRejected(message)
        }
        DappError::Rpc { message, .. } if message.to_lowercase().contains("insufficient funds") => {
            DappError::InsufficientFunds(message)
        }
        other => other,
    }
}

fn classify_send(err: DappError) -> DappError {
    match classify(err) {
        DappError::Rpc { message, .. } => DappError::Transaction(message),
        other => other,
    }
}

/// Turns successive `eth_accounts` polls into `accountsChanged` notifications.
#[derive(Debug, Default)]
struct AccountPoller {
    last: Option<Vec<Address>>,
    absent_polls: u32,
}

impl AccountPoller {
    /// Fold one poll result in. Returns the list to announce, if it changed.
    /// The first answer is the baseline. A wallet that stops answering is
    /// announced as an empty list.
    fn observe(&mut self, polled: Result<Vec<Address>>) -> Option<Vec<Address>> {
        let accounts = match polled {
            Ok(accounts) => {
                self.absent_polls = 0;
                accounts
            }
            Err(DappError::WalletAbsent | DappError::Timeout(_)) => {
                self.absent_polls += 1;
                if self.absent_polls < ABSENT_POLLS_BEFORE_RESET {
                    return None;
                }
                Vec::new()
            }
            Err(e) => {
                warn!("account watcher: {e}");
                return None;
            }
        };
        if self.last.as_ref() == Some(&accounts) {
            return None;
        }
        let baseline = self.last.replace(accounts.clone()).is_none();
        (!baseline).then_some(accounts)
    }
}

#[async_trait]
impl WalletExtension for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        // Waits on the user; the session applies the approval timeout.
        let accounts: Vec<Address> =
            request(&self.client, "eth_requestAccounts", serde_json::json!([]), None)
                .await
                .map_err(classify)?;
        info!(count = accounts.len(), "wallet authorized accounts");
        Ok(accounts)
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>> {
        accounts(&self.client, self.request_timeout).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = request(
            &self.client,
            "eth_chainId",
            serde_json::json!([]),
            Some(self.request_timeout),
        )
        .await
        .map_err(classify)?;
        Ok(id.to::<u64>())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let hash: B256 = request(&self.client, "eth_sendTransaction", (tx,), None)
            .await
            .map_err(classify_send)?;
        info!(%hash, "transaction submitted");
        Ok(hash)
    }

    fn on_accounts_changed(&self, listener: AccountsListener) -> Subscription {
        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let request_timeout = self.request_timeout;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut poller = AccountPoller::default();
            loop {
                ticker.tick().await;
                let polled = accounts(&client, request_timeout).await;
                if let Some(changed) = poller.observe(polled) {
                    debug!(count = changed.len(), "accounts changed");
                    listener(changed);
                }
            }
        });
        Subscription::from_task(task)
    }
}
