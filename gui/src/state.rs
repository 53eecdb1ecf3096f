use std::sync::Arc;

use hello_dapp_core::network::HttpNetwork;
use hello_dapp_core::{memory, DappConfig, RpcWallet, Session, SessionState};
use iced::futures::channel::mpsc;
use iced::futures::{SinkExt, Stream};
use tokio::sync::watch;

use crate::messages::Message;

/// Build the session against the demo chain or the configured endpoints.
pub(crate) async fn open_session(config: DappConfig, demo: bool) -> Session {
    if demo {
        let (chain, wallet) = memory::demo(&config);
        return Session::new(config, Arc::new(chain), Some(Arc::new(wallet)));
    }
    let network = Arc::new(HttpNetwork::new(&config));
    let wallet = RpcWallet::detect(&config).await;
    Session::new(config, network, wallet)
}

/// Forward every session state change to the UI.
pub(crate) fn state_stream(
    mut rx: watch::Receiver<SessionState>,
) -> impl Stream<Item = Message> {
    iced::stream::channel(16, |mut output: mpsc::Sender<Message>| async move {
        loop {
            let state = rx.borrow_and_update().clone();
            if output.send(Message::StateChanged(state)).await.is_err() {
                break;
            }
            // Sender dropped: the session is gone.
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}
