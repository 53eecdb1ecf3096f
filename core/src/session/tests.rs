use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, TxKind};

use super::*;
use crate::contract::{decode_update_calldata, encode_updated};
use crate::memory::{MemoryChain, MemoryWallet, SendFailure};
use crate::status::StatusKind;

const CONTRACT: Address = address!("6f3f635A9762B47954229Ea479b4541eAF402A6A");
const ALICE: Address = address!("1234000000000000000000000000000000005678");
const BOB: Address = address!("00000000000000000000000000000000000000BB");
const GOERLI: u64 = 5;

fn config() -> DappConfig {
    DappConfig {
        contract_address: CONTRACT,
        approval_timeout: Some(Duration::from_secs(30)),
        ..DappConfig::default()
    }
}

fn fixture(message: &str) -> (MemoryChain, MemoryWallet, Session) {
    let chain = MemoryChain::new(CONTRACT, GOERLI, message);
    let wallet = MemoryWallet::new(chain.clone(), vec![ALICE]);
    let session = Session::new(
        config(),
        Arc::new(chain.clone()),
        Some(Arc::new(wallet.clone())),
    );
    (chain, wallet, session)
}

#[tokio::test]
async fn bootstrap_loads_message_and_prompts_to_connect() {
    let (chain, wallet, session) = fixture("Hello World");
    assert_eq!(session.snapshot().current_message, NO_CONNECTION_MESSAGE);

    session.bootstrap().await;

    let state = session.snapshot();
    assert_eq!(state.current_message, "Hello World");
    assert_eq!(state.wallet_address, None);
    assert_eq!(state.status, Status::ConnectPrompt);
    assert!(session.is_subscribed());
    assert_eq!(chain.listener_count(), 1);
    assert_eq!(wallet.listener_count(), 1);
}

#[tokio::test]
async fn bootstrap_picks_up_authorized_account() {
    let (_chain, wallet, session) = fixture("Hello World");
    wallet.authorize();

    session.bootstrap().await;

    let state = session.snapshot();
    assert_eq!(state.wallet_address, Some(ALICE));
    assert_eq!(state.status, Status::WritePrompt);
}

#[tokio::test]
async fn bootstrap_runs_once() {
    let (chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.bootstrap().await;
    assert_eq!(chain.listener_count(), 1);
    assert_eq!(wallet.listener_count(), 1);
}

#[tokio::test]
async fn provider_failure_leaves_placeholder_and_error() {
    let (chain, wallet, session) = fixture("Hello World");
    chain.fail_provider("network down");

    session.bootstrap().await;

    let state = session.snapshot();
    assert_eq!(state.current_message, NO_CONNECTION_MESSAGE);
    assert_eq!(state.status, Status::Error("network down".into()));
    assert!(session.contract().is_none());
    assert!(!session.is_subscribed());
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn read_failure_keeps_placeholder_but_still_subscribes() {
    let (chain, _wallet, session) = fixture("Hello World");
    chain.fail_reads("execution reverted");

    session.bootstrap().await;

    let state = session.snapshot();
    assert_eq!(state.current_message, NO_CONNECTION_MESSAGE);
    assert_eq!(state.status.kind(), StatusKind::Error);
    assert!(session.is_subscribed());
}

#[tokio::test]
async fn missing_wallet_asks_for_install() {
    let chain = MemoryChain::new(CONTRACT, GOERLI, "Hello World");
    let session = Session::new(config(), Arc::new(chain), None);

    session.bootstrap().await;
    assert_eq!(session.snapshot().status, Status::InstallWallet);

    let connection = session.connect_wallet().await;
    assert_eq!(connection.address, None);
    assert_eq!(connection.status, Status::InstallWallet);
}

#[tokio::test]
async fn connect_wallet_sets_address_and_write_prompt() {
    let (_chain, _wallet, session) = fixture("Hello World");
    session.bootstrap().await;

    let connection = session.connect_wallet().await;

    assert_eq!(connection.address, Some(ALICE));
    assert_eq!(connection.status, Status::WritePrompt);
    let state = session.snapshot();
    assert_eq!(state.wallet_address, Some(ALICE));
    assert_eq!(
        state.wallet_address_string(),
        "0x1234000000000000000000000000000000005678"
    );
}

#[tokio::test]
async fn declined_connect_clears_address() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    wallet.reject_requests(true);

    let connection = session.connect_wallet().await;

    assert_eq!(connection.address, None);
    assert_eq!(connection.status, Status::Rejected);
    assert_ne!(connection.status, Status::InstallWallet);
}

#[tokio::test]
async fn accounts_changed_tracks_latest_notification() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;

    wallet.set_accounts(vec![ALICE]);
    assert_eq!(session.snapshot().wallet_address, Some(ALICE));
    assert_eq!(session.snapshot().status, Status::WritePrompt);

    wallet.set_accounts(vec![BOB, ALICE]);
    assert_eq!(session.snapshot().wallet_address, Some(BOB));

    wallet.set_accounts(vec![]);
    let state = session.snapshot();
    assert_eq!(state.wallet_address, None);
    assert_eq!(state.status, Status::ConnectPrompt);
}

#[tokio::test]
async fn update_event_sets_message_and_clears_draft() {
    let (chain, _wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.set_draft("typing...");

    // Emitted by some other account; the session does not care who.
    chain.emit(encode_updated(CONTRACT, "Hello World", "Hi"));

    let state = session.snapshot();
    assert_eq!(state.current_message, "Hi");
    assert_eq!(state.draft_message, "");
    assert_eq!(state.status, Status::Updated);
}

#[tokio::test]
async fn events_from_other_contracts_are_ignored() {
    let (chain, _wallet, session) = fixture("Hello World");
    session.bootstrap().await;

    chain.emit(encode_updated(BOB, "x", "spoofed"));

    assert_eq!(session.snapshot().current_message, "Hello World");
}

#[tokio::test]
async fn resubscribing_same_handle_keeps_one_listener() {
    let (chain, _wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    let handle = session.contract().expect("bootstrapped");

    session.replace_contract(handle.clone());
    assert_eq!(chain.listener_count(), 1);

    session.subscriber.detach();
    assert_eq!(chain.listener_count(), 0);
    session.replace_contract(handle);
    assert_eq!(chain.listener_count(), 1);

    chain.emit(encode_updated(CONTRACT, "Hello World", "Once"));
    assert_eq!(session.snapshot().current_message, "Once");
}

#[tokio::test]
async fn new_handle_replaces_old_listener() {
    let (chain, _wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    let old = session.contract().expect("bootstrapped");

    let fresh = ContractHandle::new(CONTRACT, Arc::new(chain.clone()));
    assert!(!fresh.same_as(&old));
    session.replace_contract(fresh);

    assert_eq!(chain.listener_count(), 1);
}

#[test]
fn racing_replacements_keep_stored_and_live_handle_together() {
    let (chain, _wallet, session) = fixture("Hello World");
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let handle = ContractHandle::new(CONTRACT, Arc::new(chain.clone()));
                    session.replace_contract(handle);
                }
            });
        }
    });

    let stored = session.contract().expect("replaced");
    let live = session.subscriber.active().expect("subscribed");
    assert!(stored.same_as(&live));
    assert_eq!(chain.listener_count(), 1);
}

#[tokio::test]
async fn submit_without_wallet_never_sends() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.set_draft("Hi");

    let status = session.submit().await;

    assert_eq!(status, Status::ConnectWalletFirst);
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn submit_rejects_blank_draft() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.connect_wallet().await;
    session.set_draft("   ");

    assert_eq!(session.submit().await, Status::EmptyMessage);
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test]
async fn submit_then_event_completes_the_update() {
    let (chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.connect_wallet().await;
    session.set_draft("Hi");

    let status = session.submit().await;

    let Status::Submitted { tx_hash, explorer_url } = &status else {
        panic!("expected Submitted, got {status:?}");
    };
    assert!(tx_hash.starts_with("0x"));
    assert_eq!(
        explorer_url.as_deref(),
        Some(format!("https://goerli.etherscan.io/tx/{tx_hash}").as_str())
    );

    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, Some(ALICE));
    assert_eq!(sent[0].to, Some(TxKind::Call(CONTRACT)));
    let calldata = sent[0].input.input().expect("calldata");
    assert_eq!(decode_update_calldata(calldata).unwrap(), "Hi");

    // Accepted is not confirmed: nothing changes until the event.
    let state = session.snapshot();
    assert_eq!(state.current_message, "Hello World");
    assert_eq!(state.draft_message, "Hi");

    chain.mine();
    let state = session.snapshot();
    assert_eq!(state.current_message, "Hi");
    assert_eq!(state.draft_message, "");
    assert_eq!(state.status, Status::Updated);
}

#[tokio::test]
async fn submit_failures_map_to_distinct_statuses() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.connect_wallet().await;
    session.set_draft("Hi");

    wallet.fail_next_send(SendFailure::Rejected);
    assert_eq!(session.submit().await, Status::Rejected);

    wallet.fail_next_send(SendFailure::InsufficientFunds);
    assert_eq!(session.submit().await, Status::InsufficientFunds);

    wallet.fail_next_send(SendFailure::Reverted("execution reverted".into()));
    assert_eq!(
        session.submit().await,
        Status::Error("execution reverted".into())
    );

    // Nothing is retried behind the user's back.
    assert_eq!(wallet.sent_transactions().len(), 3);
}

#[tokio::test]
async fn submit_on_wrong_chain_is_refused() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.connect_wallet().await;
    session.set_draft("Hi");
    wallet.switch_chain(1);

    let status = session.submit().await;

    assert_eq!(status.kind(), StatusKind::Error);
    assert!(status.to_string().contains("expected chain 5"));
    assert!(wallet.sent_transactions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_wallet_times_out() {
    let (_chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;
    session.connect_wallet().await;
    session.set_draft("Hi");
    wallet.fail_next_send(SendFailure::Stall);

    assert_eq!(session.submit().await, Status::TimedOut);
}

#[tokio::test]
async fn watchers_see_state_changes() {
    let (_chain, _wallet, session) = fixture("Hello World");
    let mut rx = session.watch();

    session.bootstrap().await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().current_message, "Hello World");
}

#[tokio::test]
async fn shutdown_releases_every_listener() {
    let (chain, wallet, session) = fixture("Hello World");
    session.bootstrap().await;

    drop(session);

    assert_eq!(chain.listener_count(), 0);
    assert_eq!(wallet.listener_count(), 0);
}
