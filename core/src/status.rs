/// User-facing connection status shown by every front-end.
use crate::error::DappError;

/// Semantic category of a [`Status`], for styling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Disconnected,
    Connected,
    Prompt,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing to say yet (before bootstrap finishes).
    #[default]
    Idle,
    /// No account authorized; ask the user to connect.
    ConnectPrompt,
    /// No wallet extension available at all.
    InstallWallet,
    /// Account authorized; ask for a message.
    WritePrompt,
    /// Submit attempted without a connected account.
    ConnectWalletFirst,
    /// Submit attempted with a blank draft.
    EmptyMessage,
    /// Waiting on the wallet for approval.
    Pending,
    /// The wallet accepted and broadcast the transaction.
    Submitted {
        tx_hash: String,
        explorer_url: Option<String>,
    },
    /// An `UpdatedMessages` event was observed.
    Updated,
    /// The user declined in the wallet.
    Rejected,
    InsufficientFunds,
    TimedOut,
    Error(String),
}

impl Status {
    pub fn kind(&self) -> StatusKind {
        match self {
            Status::Idle | Status::ConnectPrompt | Status::InstallWallet => {
                StatusKind::Disconnected
            }
            Status::WritePrompt => StatusKind::Connected,
            Status::ConnectWalletFirst | Status::EmptyMessage => StatusKind::Prompt,
            Status::Pending => StatusKind::Pending,
            Status::Submitted { .. } | Status::Updated => StatusKind::Success,
            Status::Rejected | Status::InsufficientFunds | Status::TimedOut | Status::Error(_) => {
                StatusKind::Error
            }
        }
    }

    /// Explorer link attached to a submitted transaction.
    pub fn link(&self) -> Option<&str> {
        match self {
            Status::Submitted { explorer_url, .. } => explorer_url.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::ConnectPrompt => {
                write!(f, "🦊 Connect to Metamask using the top right button.")
            }
            Status::InstallWallet => write!(
                f,
                "🦊 You must install Metamask, a virtual Ethereum wallet, in your browser."
            ),
            Status::WritePrompt => write!(f, "👆🏽 Write a message in the text-field above."),
            Status::ConnectWalletFirst => write!(
                f,
                "💡 Connect your Metamask wallet to update the message on the blockchain."
            ),
            Status::EmptyMessage => write!(f, "❌ Your message cannot be an empty string."),
            Status::Pending => write!(f, "⏳ Waiting for approval in your wallet..."),
            Status::Submitted {
                tx_hash,
                explorer_url,
            } => {
                match explorer_url {
                    Some(url) => write!(f, "✅ View the status of your transaction on Etherscan: {url}")?,
                    None => write!(f, "✅ Transaction submitted: {tx_hash}")?,
                }
                write!(
                    f,
                    "\nℹ️ Once the transaction is verified by the network, the message will be updated automatically."
                )
            }
            Status::Updated => write!(f, "🎉 Your message has been updated!"),
            Status::Rejected => write!(f, "😥 Request rejected in the wallet."),
            Status::InsufficientFunds => {
                write!(f, "😥 Insufficient funds to pay for this transaction.")
            }
            Status::TimedOut => write!(f, "😥 Timed out waiting for the wallet."),
            Status::Error(msg) => write!(f, "😥 {msg}"),
        }
    }
}

impl From<&DappError> for Status {
    fn from(err: &DappError) -> Self {
        if err.is_user_rejection() {
            return Status::Rejected;
        }
        match err {
            DappError::WalletAbsent => Status::InstallWallet,
            DappError::InsufficientFunds(_) => Status::InsufficientFunds,
            DappError::Timeout(_) => Status::TimedOut,
            other => Status::Error(other.to_string()),
        }
    }
}
