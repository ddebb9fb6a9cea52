//! Subscribe/notify registry for snapshot observers.
//!
//! # Invariants
//! - Owners `stage` a snapshot while still holding the lock that produced it
//!   and `flush` after releasing that lock, so staging order is mutation
//!   order.
//! - At most one thread delivers at a time. Observers never see an older
//!   snapshot after a newer one and always end on the newest. A snapshot
//!   staged while another is being delivered may be coalesced into the next
//!   delivery.
//! - Callbacks run without holding any registry lock, so a callback may
//!   subscribe, unsubscribe, read the repository it observes or mutate it.
//!   A mutation made from inside a callback is delivered after that callback
//!   round returns.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SubscriptionId = u64;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Delivery<S> {
    pending: Option<S>,
    running: bool,
}

pub struct ObserverRegistry<T: ?Sized + ToOwned> {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<SubscriptionId, Callback<T>>>,
    delivery: Mutex<Delivery<T::Owned>>,
}

impl<T: ?Sized + ToOwned> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: Mutex::new(BTreeMap::new()),
            delivery: Mutex::new(Delivery {
                pending: None,
                running: false,
            }),
        }
    }
}

impl<T: ?Sized + ToOwned> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` and returns the handle used to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(callback));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records `snapshot` as the newest state, replacing any snapshot that
    /// has not been delivered yet.
    pub fn stage(&self, snapshot: T::Owned) {
        self.lock_delivery().pending = Some(snapshot);
    }

    /// Delivers staged snapshots to every subscriber in subscription order
    /// until nothing is left.
    ///
    /// Returns at once when another call is already delivering; that call
    /// picks up whatever was staged meanwhile.
    pub fn flush(&self) {
        loop {
            let snapshot = {
                let mut delivery = self.lock_delivery();
                if delivery.running {
                    return;
                }
                match delivery.pending.take() {
                    Some(snapshot) => {
                        delivery.running = true;
                        snapshot
                    }
                    None => return,
                }
            };

            let _running = RunningFlag(&self.delivery);
            for callback in self.callbacks_snapshot() {
                callback(snapshot.borrow());
            }
        }
    }

    fn callbacks_snapshot(&self) -> Vec<Callback<T>> {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn lock_delivery(&self) -> MutexGuard<'_, Delivery<T::Owned>> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `running` when a delivery round ends, including by panic.
struct RunningFlag<'a, S>(&'a Mutex<Delivery<S>>);

impl<S> Drop for RunningFlag<'_, S> {
    fn drop(&mut self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running = false;
    }
}
