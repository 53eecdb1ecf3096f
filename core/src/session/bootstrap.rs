/// One-shot session bootstrap and the user-driven connect.
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use super::{Session, WalletConnection};
use crate::contract::ContractHandle;
use crate::error::{with_timeout, DappError};
use crate::status::Status;

impl Session {
    /// Acquire a provider, bind the contract, read the message, pick up an
    /// already-authorized account and start listening. Runs once; later
    /// calls return immediately.
    ///
    /// Failures never escape: each one ends up in the status and the session
    /// keeps rendering with whatever it has.
    pub async fn bootstrap(&self) {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            debug!("bootstrap already ran");
            return;
        }
        info!(network = %self.config.network.network, contract = %self.config.contract_address, "bootstrapping session");

        let provider = with_timeout(
            Some(self.config.request_timeout),
            "the network provider",
            self.network.provider(),
        )
        .await
        .map_err(|e| match e {
            DappError::Timeout(msg) => DappError::Provider(msg),
            other => other,
        });
        let provider = match provider {
            Ok(provider) => provider,
            Err(e) => {
                warn!("provider unavailable: {e}");
                self.set_status(Status::from(&e));
                // Account changes still need tracking so connect keeps working.
                self.tracker.install_listener(self.state.clone());
                return;
            }
        };

        let handle = ContractHandle::new(self.config.contract_address, provider);
        let read_error = match handle.read_message().await {
            Ok(message) => {
                debug!(%message, "loaded current message");
                self.state.send_modify(|s| s.current_message = message);
                None
            }
            Err(e) => {
                warn!("initial read failed: {e}");
                Some(Status::from(&e))
            }
        };
        self.replace_contract(handle);

        let connection = self.tracker.current(self.config.request_timeout).await;
        self.state.send_modify(|s| {
            s.wallet_address = connection.address;
            // A failed read outranks the wallet prompt.
            s.status = read_error.unwrap_or(connection.status);
        });

        self.tracker.install_listener(self.state.clone());
    }

    /// Ask the wallet to authorize an account and publish the result. On
    /// refusal or without a wallet the address is cleared.
    pub async fn connect_wallet(&self) -> WalletConnection {
        if self.tracker.wallet().is_some() {
            self.set_status(Status::Pending);
        }
        let connection = self.tracker.connect(self.config.approval_timeout).await;
        self.state.send_modify(|s| {
            s.wallet_address = connection.address;
            s.status = connection.status.clone();
        });
        connection
    }
}
