use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::domain::{ProviderEvent, WalletEvent};
use crate::ports::PortError;

/// Runs when a subscription ends, e.g. to call `removeListener` on the provider.
pub type ReleaseFn = Box<dyn FnOnce() -> Result<(), PortError>>;

/// Fan-out of provider events to every live [`Subscription`].
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    sequence: u64,
    queues: BTreeMap<u64, VecDeque<ProviderEvent>>,
}

impl EventHub {
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_release(None)
    }

    pub fn subscribe_with_release(&self, release: Option<ReleaseFn>) -> Subscription {
        let id = match self.inner.lock() {
            Ok(mut g) => {
                g.next_id = g.next_id.saturating_add(1);
                let id = g.next_id;
                g.queues.insert(id, VecDeque::new());
                id
            }
            Err(e) => {
                tracing::warn!("event hub lock poisoned on subscribe: {e}");
                0
            }
        };
        Subscription {
            id,
            inner: Arc::clone(&self.inner),
            release,
            active: true,
        }
    }

    /// Queues `event` for every subscriber and returns its sequence number.
    pub fn publish(&self, event: WalletEvent) -> u64 {
        let Ok(mut g) = self.inner.lock() else {
            tracing::warn!(?event, "event hub lock poisoned; dropping event");
            return 0;
        };
        g.sequence = g.sequence.saturating_add(1);
        let sequence = g.sequence;
        for queue in g.queues.values_mut() {
            queue.push_back(ProviderEvent {
                sequence,
                event: event.clone(),
            });
        }
        sequence
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().map(|g| g.queues.len()).unwrap_or(0)
    }
}

/// Scoped listener registration. Dropping it unregisters the listeners.
pub struct Subscription {
    id: u64,
    inner: Arc<Mutex<HubInner>>,
    release: Option<ReleaseFn>,
    active: bool,
}

impl Subscription {
    pub fn drain(&self) -> Result<Vec<ProviderEvent>, PortError> {
        let mut g = self
            .inner
            .lock()
            .map_err(|e| PortError::Transport(format!("event hub lock poisoned: {e}")))?;
        Ok(g.queues
            .get_mut(&self.id)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default())
    }

    /// Explicit release; unlike drop, the listener-removal error is returned.
    pub fn unsubscribe(mut self) -> Result<(), PortError> {
        self.release_now()
    }

    fn release_now(&mut self) -> Result<(), PortError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if let Ok(mut g) = self.inner.lock() {
            g.queues.remove(&self.id);
        }
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(e) = self.release_now() {
            tracing::warn!("failed to remove wallet event listeners: {e}");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}
