//! Coalescing gesture event channel.
//!
//! One publisher, any number of subscribers.  Each subscriber owns a
//! single-item slot: publishing overwrites whatever the subscriber has not
//! read yet, so a slow consumer always sees the freshest state and never a
//! backlog.  Publishing never blocks.  Subscribers only see states
//! published after they attach.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::trace;

/// Why a wait on a [`Subscriber`] returned without a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    #[error("publisher closed and no state is pending")]
    Closed,
    #[error("timed out waiting for a state")]
    Timeout,
    #[error("wait cancelled")]
    Cancelled,
}

// ── Slots ──────────────────────────────────────────────────

struct SlotState<T> {
    latest: Option<T>,
    closed: bool,
    cancelled: bool,
    /// States overwritten before they were read.
    coalesced: u64,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn new(closed: bool) -> Self {
        Self {
            state: Mutex::new(SlotState {
                latest: None,
                closed,
                cancelled: false,
                coalesced: 0,
            }),
            ready: Condvar::new(),
        }
    }

    fn offer(&self, item: T) {
        let mut st = self.state.lock();
        if st.latest.replace(item).is_some() {
            st.coalesced += 1;
            trace!(coalesced = st.coalesced, "stale state dropped");
        }
        drop(st);
        self.ready.notify_all();
    }

    fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }
}

struct Registry<T> {
    slots: Vec<Weak<Slot<T>>>,
    closed: bool,
}

struct Shared<T> {
    registry: Mutex<Registry<T>>,
}

impl<T> Shared<T> {
    fn attach(self: &Arc<Self>) -> Subscriber<T> {
        let mut reg = self.registry.lock();
        let slot = Arc::new(Slot::new(reg.closed));
        reg.slots.push(Arc::downgrade(&slot));
        Subscriber {
            slot,
            shared: Arc::clone(self),
        }
    }
}

/// Create a channel and its first subscriber.
pub fn channel<T: Clone>() -> (Publisher<T>, Subscriber<T>) {
    let shared = Arc::new(Shared {
        registry: Mutex::new(Registry {
            slots: Vec::new(),
            closed: false,
        }),
    });
    let subscriber = shared.attach();
    (Publisher { shared }, subscriber)
}

// ── Publisher ──────────────────────────────────────────────

/// Producing end.  Dropping it closes the channel.
pub struct Publisher<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> Publisher<T> {
    /// Hand `item` to every live subscriber without blocking.
    /// Returns how many subscribers received it.
    pub fn publish(&self, item: T) -> usize {
        let mut reg = self.shared.registry.lock();
        reg.slots.retain(|w| w.strong_count() > 0);

        let slots: Vec<Arc<Slot<T>>> = reg.slots.iter().filter_map(Weak::upgrade).collect();
        drop(reg);

        if slots.is_empty() {
            trace!("no subscribers, state dropped");
            return 0;
        }
        for slot in &slots {
            slot.offer(item.clone());
        }
        slots.len()
    }

    /// Attach a new subscriber.
    pub fn subscribe(&self) -> Subscriber<T> {
        self.shared.attach()
    }

    pub fn subscriber_count(&self) -> usize {
        let reg = self.shared.registry.lock();
        reg.slots.iter().filter(|w| w.strong_count() > 0).count()
    }
}

impl<T> Publisher<T> {
    /// Close the channel.  Subscribers drain any pending state, then get
    /// [`RecvError::Closed`].
    pub fn close(&self) {
        let mut reg = self.shared.registry.lock();
        reg.closed = true;
        for slot in reg.slots.iter().filter_map(Weak::upgrade) {
            slot.close();
        }
    }
}

impl<T> Drop for Publisher<T> {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Subscriber ─────────────────────────────────────────────

/// Consuming end with a single latest-wins slot.
pub struct Subscriber<T> {
    slot: Arc<Slot<T>>,
    shared: Arc<Shared<T>>,
}

impl<T> Subscriber<T> {
    /// Block until a state is available, the wait is cancelled, or the
    /// channel is closed with nothing pending.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut st = self.slot.state.lock();
        loop {
            if let Some(result) = Self::poll(&mut st) {
                return result;
            }
            self.slot.ready.wait(&mut st);
        }
    }

    /// Like [`recv`](Self::recv) with an upper bound on the wait.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        let deadline = Instant::now() + timeout;
        let mut st = self.slot.state.lock();
        loop {
            if let Some(result) = Self::poll(&mut st) {
                return result;
            }
            if self.slot.ready.wait_until(&mut st, deadline).timed_out() {
                return Self::poll(&mut st).unwrap_or(Err(RecvError::Timeout));
            }
        }
    }

    /// Take the pending state, if any, without waiting.
    pub fn try_recv(&self) -> Option<T> {
        self.slot.state.lock().latest.take()
    }

    // A cancel is checked first and leaves any pending state in place.
    fn poll(st: &mut SlotState<T>) -> Option<Result<T, RecvError>> {
        if st.cancelled {
            st.cancelled = false;
            return Some(Err(RecvError::Cancelled));
        }
        if let Some(item) = st.latest.take() {
            return Some(Ok(item));
        }
        if st.closed {
            return Some(Err(RecvError::Closed));
        }
        None
    }

    /// Handle that interrupts the current (or next) wait on this subscriber.
    pub fn cancel_handle(&self) -> CancelHandle<T> {
        CancelHandle {
            slot: Arc::downgrade(&self.slot),
        }
    }

    /// Attach another independent subscriber to the same channel.
    pub fn resubscribe(&self) -> Subscriber<T> {
        self.shared.attach()
    }

    /// How many states were overwritten before this subscriber read them.
    pub fn coalesced(&self) -> u64 {
        self.slot.state.lock().coalesced
    }

    /// Iterate until the channel closes or a wait is cancelled.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.recv().ok())
    }
}

/// Cancels a blocked [`Subscriber`] wait from another thread.
pub struct CancelHandle<T> {
    slot: Weak<Slot<T>>,
}

impl<T> Clone for CancelHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> CancelHandle<T> {
    /// Wake the waiter with [`RecvError::Cancelled`].  Any pending state
    /// stays in the slot for the next receive.
    pub fn cancel(&self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.state.lock().cancelled = true;
            slot.ready.notify_all();
        }
    }
}
