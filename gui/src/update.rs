use hello_dapp_core::Status;
use iced::Task;
use tracing::warn;

use crate::messages::Message;
use crate::state::state_stream;
use crate::App;

impl App {
    // -- Update --

    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SessionReady(handle) => {
                let session = handle.0;
                self.session = Some(session.clone());
                let watch = Task::run(state_stream(session.watch()), |m| m);
                let bootstrap = Task::perform(
                    async move { session.bootstrap().await },
                    |()| Message::Bootstrapped,
                );
                Task::batch([watch, bootstrap])
            }

            Message::Bootstrapped => {
                self.loading = false;
                Task::none()
            }

            Message::StateChanged(state) => {
                // The draft clears when an update lands; keep typing otherwise.
                if state.draft_message != self.state.draft_message {
                    self.draft = state.draft_message.clone();
                }
                self.state = state;
                Task::none()
            }

            // -- Wallet --
            Message::ConnectWallet => {
                let Some(session) = self.session.clone() else {
                    return Task::none();
                };
                self.busy = true;
                self.clear_notices();
                Task::perform(
                    async move { session.connect_wallet().await },
                    Message::WalletConnected,
                )
            }

            Message::WalletConnected(connection) => {
                self.busy = false;
                if connection.address.is_none() {
                    warn!(status = %connection.status, "wallet connection failed");
                }
                Task::none()
            }

            Message::CopyAddress => {
                let address = self.state.wallet_address_string();
                if address.is_empty() {
                    return Task::none();
                }
                if let Some(cb) = &mut self.clipboard {
                    match cb.set_text(address) {
                        Ok(_) => self.notice = Some("Address copied".into()),
                        Err(e) => self.error_message = Some(format!("Copy failed: {e}")),
                    }
                } else {
                    self.error_message = Some("Clipboard not available".into());
                }
                Task::none()
            }

            // -- Write path --
            Message::DraftChanged(text) => {
                self.draft = text.clone();
                if let Some(session) = &self.session {
                    session.set_draft(text);
                }
                Task::none()
            }

            Message::SubmitUpdate => {
                let Some(session) = self.session.clone() else {
                    return Task::none();
                };
                self.busy = true;
                self.clear_notices();
                Task::perform(
                    async move { session.submit().await },
                    Message::UpdateSubmitted,
                )
            }

            Message::UpdateSubmitted(status) => {
                self.busy = false;
                if let Status::Submitted { tx_hash, .. } = &status {
                    self.notice = Some(format!("Transaction {tx_hash} sent"));
                }
                Task::none()
            }

            Message::OpenExplorer(url) => {
                if let Err(e) = open::that(&url) {
                    self.error_message = Some(format!("Could not open browser: {e}"));
                }
                Task::none()
            }
        }
    }

    fn clear_notices(&mut self) {
        self.notice = None;
        self.error_message = None;
    }
}
