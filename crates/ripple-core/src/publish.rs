// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Outbound publisher seam and bundled adapters.
use std::sync::Mutex;

use ripple_proto::RepoEvent;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Error returned when an event could not be handed to the transport.
///
/// Publish failures are terminal for the event: the transaction has already
/// committed, so the coordinator logs and moves on. Retry, if any, belongs to
/// the transport behind the trait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The receiving side of the event channel is gone.
    #[error("event channel closed")]
    ChannelClosed,
    /// The transport rejected the event.
    #[error("publisher rejected event: {0}")]
    Rejected(String),
}

/// Accepts finalized events after commit.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    ///
    /// # Errors
    /// Returns [`PublishError`] when the event could not be accepted.
    fn publish(&self, event: RepoEvent) -> Result<(), PublishError>;
}

/// Publisher that pipes events into an unbounded channel.
///
/// The receiving half is typically drained by an async forwarding task that
/// serializes onto the real transport; this half stays synchronous so the
/// post-commit flush never awaits.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: UnboundedSender<RepoEvent>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<RepoEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: RepoEvent) -> Result<(), PublishError> {
        self.tx.send(event).map_err(|_| PublishError::ChannelClosed)
    }
}

/// Publisher that buffers events in memory.
///
/// A test and harness aid: assertions drain the buffer with
/// [`VecPublisher::take`].
#[derive(Debug, Default)]
pub struct VecPublisher {
    events: Mutex<Vec<RepoEvent>>,
}

impl VecPublisher {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything published so far.
    #[must_use]
    pub fn take(&self) -> Vec<RepoEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns `true` when nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventPublisher for VecPublisher {
    fn publish(&self, event: RepoEvent) -> Result<(), PublishError> {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
        Ok(())
    }
}
