/// JSON-RPC node access: the read provider used for contract calls and log watching.
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxKind};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::TransactionInput;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{validate_endpoint_url, DappConfig, Network, NetworkConfig};
use crate::error::{with_timeout, DappError, Result};
use crate::provider::{
    log_matches, Filter, Log, LogListener, NetworkAccess, ReadProvider, TransactionRequest,
};
use crate::rpc::{http_client, rpc_error};
use crate::subscription::Subscription;

/// Widest block range asked of `eth_getLogs` in one call.
const MAX_LOG_RANGE: u64 = 1_000;
/// Consecutive failed scans of one range before it is skipped.
const MAX_FAILED_SCANS: u32 = 3;

#[derive(Debug, Clone)]
pub struct NetworkStatus {
    pub network: Network,
    pub chain_id: u64,
    pub block_number: u64,
    /// Node host only; API keys in the path are never shown.
    pub node_host: String,
}

/// Read-only node connection shared by the client and its log watchers.
#[derive(Clone)]
struct Node {
    provider: RootProvider,
    request_timeout: Duration,
}

impl Node {
    async fn block_number(&self) -> Result<u64> {
        let call = async {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| rpc_error("eth_blockNumber", e))
        };
        with_timeout(Some(self.request_timeout), "eth_blockNumber", call).await
    }

    async fn logs(&self, filter: &Filter, range: &RangeInclusive<u64>) -> Result<Vec<Log>> {
        let filter = filter
            .clone()
            .from_block(*range.start())
            .to_block(*range.end());
        let call = async {
            self.provider
                .get_logs(&filter)
                .await
                .map_err(|e| rpc_error("eth_getLogs", e))
        };
        with_timeout(Some(self.request_timeout), "eth_getLogs", call).await
    }
}

pub struct NetworkClient {
    node: Node,
    network: Network,
    node_host: String,
    poll_interval: Duration,
}

impl NetworkClient {
    pub fn new(
        config: &NetworkConfig,
        allow_insecure: bool,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let url = validate_endpoint_url(&config.rpc_url()?, allow_insecure)?;
        let node_host = url.host_str().unwrap_or("unknown").to_string();
        let client = http_client(url, request_timeout)?;
        Ok(Self {
            node: Node {
                provider: RootProvider::new(client),
                request_timeout,
            },
            network: config.network,
            node_host,
            poll_interval,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub async fn block_number(&self) -> Result<u64> {
        self.node.block_number().await
    }

    /// Query chain id, head block and node host.
    pub async fn status(&self) -> Result<NetworkStatus> {
        let chain_id = self.chain_id().await?;
        let block_number = self.block_number().await?;
        Ok(NetworkStatus {
            network: self.network,
            chain_id,
            block_number,
            node_host: self.node_host.clone(),
        })
    }
}

#[async_trait]
impl ReadProvider for NetworkClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(data),
            ..Default::default()
        };
        let call = async {
            self.node
                .provider
                .call(tx)
                .await
                .map_err(|e| rpc_error("eth_call", e))
        };
        with_timeout(Some(self.node.request_timeout), "eth_call", call).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let call = async {
            self.node
                .provider
                .get_chain_id()
                .await
                .map_err(|e| rpc_error("eth_chainId", e))
        };
        with_timeout(Some(self.node.request_timeout), "eth_chainId", call).await
    }

    fn watch_logs(&self, filter: Filter, listener: LogListener) -> Subscription {
        let node = self.node.clone();
        let poll_interval = self.poll_interval;
        debug!(?filter, "watching logs");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut cursor = LogCursor::default();
            loop {
                ticker.tick().await;
                let head = match node.block_number().await {
                    Ok(head) => head,
                    Err(e) => {
                        warn!("log watcher: failed to query head block: {e}");
                        continue;
                    }
                };
                let Some(range) = cursor.next_range(head) else {
                    continue;
                };
                match node.logs(&filter, &range).await {
                    Ok(logs) => {
                        for log in logs.into_iter().filter(|l| log_matches(&filter, l)) {
                            listener(Ok(log));
                        }
                        cursor.scanned(*range.end());
                    }
                    Err(e) => {
                        warn!(from = range.start(), to = range.end(), "log watcher: eth_getLogs failed: {e}");
                        if cursor.failed(*range.end()) {
                            listener(Err(e));
                        }
                    }
                }
            }
        });
        Subscription::from_task(task)
    }
}

/// Block bookkeeping for the log poller.
#[derive(Debug, Default)]
struct LogCursor {
    /// Next block to scan; unset until the first head is seen.
    next: Option<u64>,
    failures: u32,
}

impl LogCursor {
    /// Blocks to scan for `head`, at most [`MAX_LOG_RANGE`] wide. The first
    /// head seen is the baseline and yields nothing.
    fn next_range(&mut self, head: u64) -> Option<RangeInclusive<u64>> {
        let Some(from) = self.next else {
            self.next = Some(head + 1);
            return None;
        };
        if head < from {
            return None;
        }
        Some(from..=head.min(from + MAX_LOG_RANGE - 1))
    }

    fn scanned(&mut self, to: u64) {
        self.next = Some(to + 1);
        self.failures = 0;
    }

    /// Record a failed scan ending at `to`. Returns `true` only for the first
    /// failure in a row. After [`MAX_FAILED_SCANS`] the range is skipped.
    fn failed(&mut self, to: u64) -> bool {
        self.failures += 1;
        let first = self.failures == 1;
        if self.failures >= MAX_FAILED_SCANS {
            warn!(to, "log watcher: skipping blocks the node keeps refusing");
            self.scanned(to);
        }
        first
    }
}

/// Network access layer backed by a JSON-RPC node.
pub struct HttpNetwork {
    config: NetworkConfig,
    allow_insecure: bool,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl HttpNetwork {
    pub fn new(config: &DappConfig) -> Self {
        Self {
            config: config.network.clone(),
            allow_insecure: config.allow_insecure,
            poll_interval: config.poll_interval,
            request_timeout: config.request_timeout,
        }
    }

    /// Build a client without the reachability check.
    pub fn client(&self) -> Result<NetworkClient> {
        NetworkClient::new(
            &self.config,
            self.allow_insecure,
            self.poll_interval,
            self.request_timeout,
        )
    }
}

#[async_trait]
impl NetworkAccess for HttpNetwork {
    async fn provider(&self) -> Result<Arc<dyn ReadProvider>> {
        let network = self.config.network;
        let client = self
            .client()
            .map_err(|e| DappError::Provider(format!("Cannot create {network} provider: {e}")))?;
        let chain_id = client
            .chain_id()
            .await
            .map_err(|e| DappError::Provider(format!("Cannot reach {network} node: {e}")))?;
        if let Some(expected) = network.chain_id() {
            if chain_id != expected {
                return Err(DappError::Provider(format!(
                    "Node reports chain {chain_id}, expected {expected} for {network}"
                )));
            }
        }
        info!(%network, chain_id, "provider ready");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn custom(url: &str) -> NetworkConfig {
        NetworkConfig {
            network: Network::Custom,
            custom_url: Some(url.to_string()),
            api_key: None,
        }
    }

    fn client(config: &NetworkConfig) -> Result<NetworkClient> {
        NetworkClient::new(config, false, Duration::from_secs(1), Duration::from_secs(1))
    }

    #[test]
    fn custom_network_without_url_fails() {
        let config = NetworkConfig {
            network: Network::Custom,
            custom_url: None,
            api_key: None,
        };
        let err = client(&config).err().expect("should fail");
        assert!(err.to_string().contains("Custom network requires a node URL"));
    }

    #[test]
    fn rejects_remote_http_url_without_insecure() {
        let err = client(&custom("http://node.example.org:8545"))
            .err()
            .expect("should fail");
        assert!(err.to_string().contains("--insecure"));
    }

    #[test]
    fn first_head_is_the_baseline() {
        let mut cursor = LogCursor::default();
        assert_eq!(cursor.next_range(100), None);
        assert_eq!(cursor.next_range(100), None);
        assert_eq!(cursor.next_range(103), Some(101..=103));
    }

    #[test]
    fn cursor_advances_past_scanned_blocks() {
        let mut cursor = LogCursor::default();
        cursor.next_range(10);
        let range = cursor.next_range(12).unwrap();
        cursor.scanned(*range.end());
        assert_eq!(cursor.next_range(12), None);
        assert_eq!(cursor.next_range(13), Some(13..=13));
    }

    #[test]
    fn failed_scan_keeps_the_cursor() {
        let mut cursor = LogCursor::default();
        cursor.next_range(10);
        let range = cursor.next_range(15).unwrap();
        assert!(cursor.failed(*range.end()));
        assert_eq!(cursor.next_range(15), Some(11..=15));
        // Later failures in the same run are not reported again.
        assert!(!cursor.failed(15));
    }

    #[test]
    fn range_that_keeps_failing_is_skipped() {
        let mut cursor = LogCursor::default();
        cursor.next_range(10);
        for _ in 0..MAX_FAILED_SCANS {
            let range = cursor.next_range(20).unwrap();
            assert_eq!(range, 11..=20);
            cursor.failed(*range.end());
        }
        assert_eq!(cursor.next_range(20), None);
        assert_eq!(cursor.next_range(21), Some(21..=21));
        // The streak starts over after the skip.
        assert!(cursor.failed(21));
    }

    #[test]
    fn long_gap_is_scanned_in_chunks() {
        let mut cursor = LogCursor::default();
        cursor.next_range(0);
        let first = cursor.next_range(5_000).unwrap();
        assert_eq!(first, 1..=MAX_LOG_RANGE);
        cursor.scanned(*first.end());
        assert_eq!(
            cursor.next_range(5_000),
            Some(MAX_LOG_RANGE + 1..=2 * MAX_LOG_RANGE)
        );
    }

    #[tokio::test]
    async fn unreachable_node_is_a_provider_error() {
        let config = DappConfig {
            // Port 9 (discard) is closed on any sane test host.
            network: custom("http://127.0.0.1:9"),
            ..DappConfig::default()
        };
        let err = HttpNetwork::new(&config).provider().await.err().expect("should fail");
        assert!(matches!(err, DappError::Provider(_)), "got {err:?}");
        assert!(err.to_string().contains("Cannot reach custom node"));
    }

    #[tokio::test]
    async fn silent_node_is_a_provider_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        let config = DappConfig {
            network: custom(&format!("http://{addr}")),
            request_timeout: Duration::from_millis(300),
            ..DappConfig::default()
        };
        let err = HttpNetwork::new(&config).provider().await.err().expect("should fail");
        assert!(matches!(err, DappError::Provider(_)), "got {err:?}");
        assert!(err.to_string().contains("Timed out"));
    }
}
