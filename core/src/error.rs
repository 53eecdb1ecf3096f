//! Domain error type for the connection lifecycle.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Typed error enum for provider, contract and wallet operations, allowing
/// callers to match on specific failure modes instead of inspecting opaque
/// `anyhow::Error` messages.
#[derive(Debug, Error)]
pub enum DappError {
    /// Provider acquisition or network reachability failure.
    #[error("{0}")]
    Provider(String),

    /// Contract read call failed or returned undecodable data.
    #[error("{0}")]
    Read(String),

    /// No wallet extension is available to talk to.
    #[error("No wallet extension found")]
    WalletAbsent,

    /// The user declined the request in the wallet.
    #[error("{0}")]
    WalletRejected(String),

    /// Transaction submission, signature or on-chain failure.
    #[error("{0}")]
    Transaction(String),

    /// The sending account cannot cover value plus gas.
    #[error("{0}")]
    InsufficientFunds(String),

    /// The wallet is connected to a different chain than the contract.
    #[error("Wallet is on chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    /// The wallet did not answer within the configured approval window.
    #[error("{0}")]
    Timeout(String),

    /// ABI or log payload could not be decoded.
    #[error("{0}")]
    Decode(String),

    /// JSON-RPC error object returned by a node or wallet.
    #[error("{message} (code {code})")]
    Rpc { code: i64, message: String },

    /// Transport-level failure reaching a JSON-RPC endpoint.
    #[error("{0}")]
    RpcTransport(String),

    /// Invalid configuration (URL, address, network selection).
    #[error("{0}")]
    InvalidConfig(String),

    /// Unexpected error from internal subsystems.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DappError {
    /// EIP-1193 code for "user rejected the request".
    pub const USER_REJECTED_CODE: i64 = 4001;

    /// Whether this error means the user declined in the wallet UI.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            DappError::WalletRejected(_) => true,
            DappError::Rpc { code, .. } => *code == Self::USER_REJECTED_CODE,
            _ => false,
        }
    }
}

/// Alias for `std::result::Result<T, DappError>`.
pub type Result<T> = std::result::Result<T, DappError>;

/// Bound `fut` by `limit`; `None` waits indefinitely.
pub async fn with_timeout<T>(
    limit: Option<Duration>,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            DappError::Timeout(format!(
                "Timed out after {}s waiting for {what}",
                limit.as_secs_f32()
            ))
        })?,
    }
}
