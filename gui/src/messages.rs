use std::sync::Arc;

use hello_dapp_core::{Session, SessionState, Status, WalletConnection};

/// Shared session, carried through messages once it is built.
#[derive(Clone)]
pub(crate) struct SessionHandle(pub(crate) Arc<Session>);

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionHandle")
    }
}

// -- Messages --

#[derive(Debug, Clone)]
pub(crate) enum Message {
    // Startup
    SessionReady(SessionHandle),
    Bootstrapped,

    // Session state mirror
    StateChanged(SessionState),

    // Wallet
    ConnectWallet,
    WalletConnected(WalletConnection),
    CopyAddress,

    // Write path
    DraftChanged(String),
    SubmitUpdate,
    UpdateSubmitted(Status),
    OpenExplorer(String),
}
