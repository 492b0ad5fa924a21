//! Publish/subscribe seam between the write path and post-commit consumers.
//!
//! Only committed facts are published. Delivery is at-least-once and nothing
//! is persisted here: the billing store stays the source of truth, so a lost
//! message costs a side effect (a notice), never a state change.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Receiving end of one subscriber. Sees every message published after it
/// was created.
#[derive(Debug)]
pub struct Subscription<M> {
    inbox: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(inbox: Receiver<M>) -> Self {
        Self { inbox }
    }

    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.inbox.try_recv()
    }

    /// Wait up to `timeout`; `Disconnected` once the bus is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.inbox.recv_timeout(timeout)
    }

    /// Everything already queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.inbox.try_iter().collect()
    }
}

pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Fan `message` out to current subscribers. Callers publish after
    /// commit and decide whether a failure matters.
    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        B::publish(self, message)
    }

    fn subscribe(&self) -> Subscription<M> {
        B::subscribe(self)
    }
}
