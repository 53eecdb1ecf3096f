/// `UpdatedMessages` subscriber: two states, keyed on the contract handle.
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{lock, StateTx};
use crate::contract::{decode_updated, ContractHandle};
use crate::error::Result;
use crate::provider::Log;
use crate::status::Status;
use crate::subscription::Subscription;

enum SubscriberState {
    Unsubscribed,
    Subscribed {
        handle: ContractHandle,
        subscription: Subscription,
    },
}

pub(crate) struct MessageSubscriber {
    state: Mutex<SubscriberState>,
}

impl MessageSubscriber {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SubscriberState::Unsubscribed),
        }
    }

    /// Subscribe to `handle`'s events. Any listener on a different handle is
    /// disposed first, under the same lock, so two are never live at once.
    pub(crate) fn attach(&self, handle: &ContractHandle, state: StateTx) {
        let mut current = lock(&self.state);
        if let SubscriberState::Subscribed { handle: active, .. } = &*current {
            if active.same_as(handle) {
                debug!("already subscribed to this contract handle");
                return;
            }
        }
        if let SubscriberState::Subscribed { subscription, .. } =
            std::mem::replace(&mut *current, SubscriberState::Unsubscribed)
        {
            debug!("contract handle changed, dropping old listener");
            subscription.unsubscribe();
        }

        let subscription = handle.watch_updates(std::sync::Arc::new(move |event: Result<Log>| {
            apply_event(&state, event);
        }));
        debug!(address = %handle.address(), "subscribed to UpdatedMessages");
        *current = SubscriberState::Subscribed {
            handle: handle.clone(),
            subscription,
        };
    }

    pub(crate) fn detach(&self) {
        let previous = std::mem::replace(&mut *lock(&self.state), SubscriberState::Unsubscribed);
        if let SubscriberState::Subscribed { subscription, .. } = previous {
            subscription.unsubscribe();
        }
    }

    /// Handle the live listener is bound to.
    #[cfg(test)]
    pub(crate) fn active(&self) -> Option<ContractHandle> {
        match &*lock(&self.state) {
            SubscriberState::Subscribed { handle, .. } => Some(handle.clone()),
            SubscriberState::Unsubscribed => None,
        }
    }

    pub(crate) fn is_subscribed(&self) -> bool {
        matches!(&*lock(&self.state), SubscriberState::Subscribed { .. })
    }
}

fn apply_event(state: &StateTx, event: Result<Log>) {
    match event.and_then(|log| decode_updated(&log)) {
        Ok(update) => state.send_modify(|s| {
            s.current_message = update.new_message;
            s.draft_message.clear();
            s.status = Status::Updated;
        }),
        Err(e) => {
            warn!("UpdatedMessages listener: {e}");
            state.send_modify(|s| s.status = Status::from(&e));
        }
    }
}
