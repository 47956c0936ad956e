//! Load session: serializes concurrent loads so a slow, older load can never
//! overwrite the result of a newer one.
//!
//! Every load takes a [`LoadTicket`] before it starts. A result is committed
//! only if no newer ticket has been issued since; a superseded load is
//! abandoned even when nothing has been committed yet.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::store::{LoadedLocations, LocationStore};

/// Monotonic token handed out by [`LocationSession::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Default)]
pub struct LocationSession {
    next_ticket: AtomicU64,
    committed: RwLock<Option<(LoadTicket, Arc<LoadedLocations>)>>,
}

impl LocationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the ticket for a load that is about to start.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Commits `loaded` if `ticket` is the most recently issued ticket and
    /// has not been committed yet.
    ///
    /// Returns `false` when a newer load has started since `ticket` was
    /// issued; the result is discarded without touching committed state.
    pub async fn commit(&self, ticket: LoadTicket, loaded: LoadedLocations) -> bool {
        let mut slot = self.committed.write().await;
        let latest = self.next_ticket.load(Ordering::SeqCst);
        if ticket.value() != latest {
            tracing::debug!(
                ticket = ticket.value(),
                latest,
                "discarding superseded load result"
            );
            return false;
        }
        if let Some((current, _)) = slot.as_ref() {
            if ticket <= *current {
                tracing::debug!(
                    ticket = ticket.value(),
                    committed = current.value(),
                    "load result already committed"
                );
                return false;
            }
        }
        tracing::debug!(
            ticket = ticket.value(),
            origin = loaded.origin.label(),
            count = loaded.locations.len(),
            "committed load result"
        );
        *slot = Some((ticket, Arc::new(loaded)));
        true
    }

    /// The latest committed collection, or `None` while the first load is
    /// still in flight.
    pub async fn current(&self) -> Option<Arc<LoadedLocations>> {
        self.committed
            .read()
            .await
            .as_ref()
            .map(|(_, loaded)| Arc::clone(loaded))
    }

    /// Runs one full load against `store` and commits it.
    pub async fn refresh(&self, store: &LocationStore) -> bool {
        let ticket = self.begin();
        let loaded = store.load().await;
        self.commit(ticket, loaded).await
    }
}
