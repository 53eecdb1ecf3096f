/// Typed handle to the deployed HelloWorld contract.
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, TxKind};
use alloy_rpc_types_eth::TransactionInput;
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};

use crate::error::{DappError, Result};
use crate::provider::{Filter, Log, LogListener, ReadProvider, TransactionRequest};
use crate::subscription::Subscription;

sol! {
    contract HelloWorld {
        event UpdatedMessages(string oldStr, string newStr);

        function message() external view returns (string);
        function update(string newMessage) external;
    }
}

/// Payload of one `UpdatedMessages` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUpdate {
    pub old_message: String,
    pub new_message: String,
}

struct Inner {
    address: Address,
    provider: Arc<dyn ReadProvider>,
}

/// Capability bound to (provider, contract address, ABI). Cheap to clone;
/// clones share identity, see [`ContractHandle::same_as`].
#[derive(Clone)]
pub struct ContractHandle {
    inner: Arc<Inner>,
}

impl ContractHandle {
    pub fn new(address: Address, provider: Arc<dyn ReadProvider>) -> Self {
        Self {
            inner: Arc::new(Inner { address, provider }),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn provider(&self) -> &Arc<dyn ReadProvider> {
        &self.inner.provider
    }

    /// Whether both handles came from the same construction.
    pub fn same_as(&self, other: &ContractHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the stored message.
    pub async fn read_message(&self) -> Result<String> {
        let data = Bytes::from(HelloWorld::messageCall {}.abi_encode());
        let out = self
            .inner
            .provider
            .call(self.inner.address, data)
            .await
            .map_err(|e| DappError::Read(format!("Failed to read message: {e}")))?;
        HelloWorld::messageCall::abi_decode_returns(&out)
            .map_err(|e| DappError::Read(format!("Failed to decode message: {e}")))
    }

    /// Calldata for `update(newMessage)`.
    pub fn update_calldata(&self, new_message: &str) -> Bytes {
        Bytes::from(
            HelloWorld::updateCall {
                newMessage: new_message.to_string(),
            }
            .abi_encode(),
        )
    }

    /// `update(newMessage)` sent from `from`. Gas and fees are left to the wallet.
    pub fn update_transaction(&self, from: Address, new_message: &str) -> TransactionRequest {
        let data = self.update_calldata(new_message);
        TransactionRequest {
            from: Some(from),
            to: Some(TxKind::Call(self.inner.address)),
            // Wallets differ in which key they read.
            input: TransactionInput {
                input: Some(data.clone()),
                data: Some(data),
            },
            ..Default::default()
        }
    }

    /// Every `UpdatedMessages` emitted by this contract.
    pub fn updated_messages_filter(&self) -> Filter {
        Filter::new()
            .address(self.inner.address)
            .event_signature(HelloWorld::UpdatedMessages::SIGNATURE_HASH)
    }

    pub fn watch_updates(&self, listener: LogListener) -> Subscription {
        self.inner
            .provider
            .watch_logs(self.updated_messages_filter(), listener)
    }
}

impl std::fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.inner.address)
            .finish_non_exhaustive()
    }
}

/// Decode an `UpdatedMessages` log.
pub fn decode_updated(log: &Log) -> Result<MessageUpdate> {
    if log.topic0() != Some(&HelloWorld::UpdatedMessages::SIGNATURE_HASH) {
        return Err(DappError::Decode(
            "Log is not an UpdatedMessages event".into(),
        ));
    }
    let event = HelloWorld::UpdatedMessages::decode_log_data(log.data())
        .map_err(|e| DappError::Decode(format!("Invalid UpdatedMessages log: {e}")))?;
    Ok(MessageUpdate {
        old_message: event.oldStr,
        new_message: event.newStr,
    })
}

/// Build the log the contract would emit for `old -> new`. Used by fakes and tests.
pub fn encode_updated(address: Address, old: &str, new: &str) -> Log {
    let event = HelloWorld::UpdatedMessages {
        oldStr: old.to_string(),
        newStr: new.to_string(),
    };
    Log {
        inner: alloy_primitives::Log {
            address,
            data: event.encode_log_data(),
        },
        ..Default::default()
    }
}

/// ABI-encoded return data of `message()`. Used by fakes and tests.
pub fn encode_message_return(message: &str) -> Bytes {
    Bytes::from((message.to_string(),).abi_encode_params())
}

/// Whether `data` is a call to `message()`.
pub fn is_message_call(data: &[u8]) -> bool {
    data.starts_with(&HelloWorld::messageCall::SELECTOR)
}

/// Decode `update(newMessage)` calldata back into the message.
pub fn decode_update_calldata(data: &[u8]) -> Result<String> {
    HelloWorld::updateCall::abi_decode(data)
        .map(|call| call.newMessage)
        .map_err(|e| DappError::Decode(format!("Invalid update calldata: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const CONTRACT: Address = address!("6f3f635A9762B47954229Ea479b4541eAF402A6A");

    #[test]
    fn event_signature_matches_abi() {
        assert_eq!(
            HelloWorld::UpdatedMessages::SIGNATURE,
            "UpdatedMessages(string,string)"
        );
    }

    #[test]
    fn decodes_new_value_from_log() {
        let log = encode_updated(CONTRACT, "Hello World", "Hi");
        let update = decode_updated(&log).unwrap();
        assert_eq!(update.old_message, "Hello World");
        assert_eq!(update.new_message, "Hi");
    }

    #[test]
    fn rejects_log_with_foreign_topic() {
        let mut log = encode_updated(CONTRACT, "a", "b");
        log.topics_mut()[0] = alloy_primitives::B256::ZERO;
        assert!(decode_updated(&log).is_err());
    }

    #[test]
    fn update_transaction_targets_contract() {
        let chain = crate::memory::MemoryChain::new(CONTRACT, 5, "");
        let handle = ContractHandle::new(CONTRACT, std::sync::Arc::new(chain));
        let from = address!("1234000000000000000000000000000000005678");
        let tx = handle.update_transaction(from, "Hi");
        assert_eq!(tx.from, Some(from));
        assert_eq!(tx.to, Some(TxKind::Call(CONTRACT)));
        let data = tx.input.input().unwrap();
        assert_eq!(decode_update_calldata(data).unwrap(), "Hi");
    }

    #[test]
    fn filter_selects_updated_messages() {
        let chain = crate::memory::MemoryChain::new(CONTRACT, 5, "");
        let handle = ContractHandle::new(CONTRACT, std::sync::Arc::new(chain));
        let filter = handle.updated_messages_filter();
        assert!(crate::provider::log_matches(&filter, &encode_updated(CONTRACT, "a", "b")));
        assert!(!crate::provider::log_matches(
            &filter,
            &encode_updated(alloy_primitives::Address::ZERO, "a", "b")
        ));
    }

    #[test]
    fn update_calldata_starts_with_selector() {
        let data = HelloWorld::updateCall {
            newMessage: "Hi".into(),
        }
        .abi_encode();
        assert_eq!(&data[..4], HelloWorld::updateCall::SELECTOR.as_slice());
        assert_eq!(decode_update_calldata(&data).unwrap(), "Hi");
    }
}
