/// Network selection and the injected session configuration.
use std::time::Duration;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::error::{DappError, Result};

/// Address of the deployed HelloWorld contract on Goerli.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("6f3f635A9762B47954229Ea479b4541eAF402A6A");

/// Local EIP-1193 wallet endpoint (Frame and compatible desktop wallets).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

/// Alchemy's shared key, used when no key is configured.
pub const DEMO_API_KEY: &str = "demo";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);
const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Goerli,
    Sepolia,
    Custom,
}

impl Network {
    /// EIP-155 chain id, unknown for custom networks.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Mainnet => Some(1),
            Network::Goerli => Some(5),
            Network::Sepolia => Some(11_155_111),
            Network::Custom => None,
        }
    }

    /// Etherscan base URL for this network.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("https://etherscan.io"),
            Network::Goerli => Some("https://goerli.etherscan.io"),
            Network::Sepolia => Some("https://sepolia.etherscan.io"),
            Network::Custom => None,
        }
    }

    fn alchemy_host(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("eth-mainnet.g.alchemy.com"),
            Network::Goerli => Some("eth-goerli.g.alchemy.com"),
            Network::Sepolia => Some("eth-sepolia.g.alchemy.com"),
            Network::Custom => None,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Goerli => write!(f, "goerli"),
            Network::Sepolia => write!(f, "sepolia"),
            Network::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "goerli" => Ok(Network::Goerli),
            "sepolia" => Ok(Network::Sepolia),
            "custom" => Ok(Network::Custom),
            other => Err(DappError::InvalidConfig(format!(
                "Unknown network '{other}'. Use mainnet, goerli, sepolia or custom."
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct NetworkConfig {
    pub network: Network,
    pub custom_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl NetworkConfig {
    /// Build the JSON-RPC endpoint for this network.
    /// Known networks go through Alchemy; a missing key falls back to the demo key.
    pub fn rpc_url(&self) -> Result<String> {
        if let Some(url) = &self.custom_url {
            return Ok(url.clone());
        }
        let host = self.network.alchemy_host().ok_or_else(|| {
            DappError::InvalidConfig("Custom network requires a node URL".into())
        })?;
        let key = self.api_key.as_deref().unwrap_or(DEMO_API_KEY);
        Ok(format!("https://{host}/v2/{key}"))
    }
}

/// Reject non-HTTPS endpoint URLs unless `allow_insecure` is set or the host is loopback.
pub fn validate_endpoint_url(raw: &str, allow_insecure: bool) -> Result<url::Url> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| DappError::InvalidConfig(format!("Invalid URL '{raw}': {e}")))?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" => {
            let loopback = matches!(
                parsed.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("[::1]")
            );
            if allow_insecure || loopback {
                Ok(parsed)
            } else {
                Err(DappError::InvalidConfig(format!(
                    "Refusing to connect over plain HTTP: {raw}\nUse --insecure to allow unencrypted connections."
                )))
            }
        }
        _ => Err(DappError::InvalidConfig(format!(
            "Invalid URL scheme: {raw}\nExpected an https:// URL."
        ))),
    }
}

/// Everything a session needs to know about where it talks to.
/// Built once by the front-end and handed to [`crate::Session::new`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DappConfig {
    pub network: NetworkConfig,
    pub contract_address: Address,
    pub wallet_url: String,
    #[serde(default)]
    pub allow_insecure: bool,
    /// How often log and account watchers poll their endpoint.
    pub poll_interval: Duration,
    /// Upper bound on waiting for wallet approval. `None` waits indefinitely.
    pub approval_timeout: Option<Duration>,
    /// Upper bound on any node or wallet request that needs no user approval.
    pub request_timeout: Duration,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            wallet_url: DEFAULT_WALLET_URL.to_string(),
            allow_insecure: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            approval_timeout: Some(DEFAULT_APPROVAL_TIMEOUT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DappConfig {
    /// Link to a transaction on the network's block explorer, if it has one.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.network
            .network
            .explorer_url()
            .map(|base| format!("{base}/tx/{tx_hash}"))
    }
}
