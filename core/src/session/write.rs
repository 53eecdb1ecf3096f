/// Write path: validate, then send `update(newMessage)` through the wallet.
///
/// A `Submitted` status only means the wallet accepted the transaction. The
/// stored message changes when the `UpdatedMessages` event arrives.
use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{info, warn};

use super::Session;
use crate::config::DappConfig;
use crate::contract::ContractHandle;
use crate::error::{with_timeout, DappError};
use crate::provider::WalletExtension;
use crate::status::Status;

/// Checked inputs for one update transaction.
struct UpdateRequest<'a> {
    wallet: &'a Arc<dyn WalletExtension>,
    handle: &'a ContractHandle,
    from: Address,
    message: &'a str,
}

fn prepare<'a>(
    wallet: Option<&'a Arc<dyn WalletExtension>>,
    handle: Option<&'a ContractHandle>,
    from: Option<Address>,
    draft: &'a str,
) -> Result<UpdateRequest<'a>, Status> {
    let (Some(wallet), Some(from)) = (wallet, from) else {
        return Err(Status::ConnectWalletFirst);
    };
    if draft.trim().is_empty() {
        return Err(Status::EmptyMessage);
    }
    let Some(handle) = handle else {
        return Err(Status::Error("Not connected to the network.".into()));
    };
    Ok(UpdateRequest {
        wallet,
        handle,
        from,
        message: draft,
    })
}

async fn send(request: UpdateRequest<'_>, config: &DappConfig) -> Status {
    let UpdateRequest {
        wallet,
        handle,
        from,
        message,
    } = request;

    if let Some(expected) = config.network.network.chain_id() {
        let chain_id = with_timeout(
            Some(config.request_timeout),
            "wallet chain id",
            wallet.chain_id(),
        );
        match chain_id.await {
            Ok(actual) if actual != expected => {
                return Status::from(&DappError::WrongNetwork { expected, actual });
            }
            Ok(_) => {}
            Err(e) => return Status::from(&e),
        }
    }

    let tx = handle.update_transaction(from, message);
    match with_timeout(
        config.approval_timeout,
        "transaction approval",
        wallet.send_transaction(tx),
    )
    .await
    {
        Ok(hash) => {
            let tx_hash = hash.to_string();
            info!(%tx_hash, "update submitted");
            Status::Submitted {
                explorer_url: config.explorer_tx_url(&tx_hash),
                tx_hash,
            }
        }
        Err(e) => {
            warn!("update failed: {e}");
            Status::from(&e)
        }
    }
}

/// Submit `draft` as the new message from `from`. Never retries; every
/// failure comes back as a status.
pub async fn submit_update(
    config: &DappConfig,
    wallet: Option<&Arc<dyn WalletExtension>>,
    handle: Option<&ContractHandle>,
    from: Option<Address>,
    draft: &str,
) -> Status {
    match prepare(wallet, handle, from, draft) {
        Ok(request) => send(request, config).await,
        Err(status) => status,
    }
}

impl Session {
    /// Submit the current draft. The returned status is also published.
    pub async fn submit(&self) -> Status {
        let snapshot = self.snapshot();
        let handle = self.contract();
        let status = match prepare(
            self.tracker.wallet(),
            handle.as_ref(),
            snapshot.wallet_address,
            &snapshot.draft_message,
        ) {
            Ok(request) => {
                self.set_status(Status::Pending);
                send(request, &self.config).await
            }
            Err(status) => status,
        };
        self.set_status(status.clone());
        status
    }
}
