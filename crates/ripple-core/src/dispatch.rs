// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Notification dispatch: an explicit kind → handler table.
//!
//! Each raw notification kind is bound to a plain function pointer that
//! applies the kind-specific mutation to a consolidator. The table is built
//! once at coordinator construction and is immutable afterwards; duplicate
//! registrations are rejected rather than silently replaced.

use thiserror::Error;
use tracing::warn;

use crate::consolidator::Consolidator;
use crate::notification::{Notice, NoticeDetail, NotificationKind};

/// Function pointer that applies one notification to a consolidator.
///
/// Handlers are pure state transitions: they read the [`Notice`] and mutate
/// the consolidator, nothing else. Snapshot capture and filtering are the
/// coordinator's concern and happen before dispatch.
pub type ApplyFn = fn(&mut Consolidator, &Notice);

/// One registered notification handler.
#[derive(Clone, Copy)]
pub struct NotificationHandler {
    /// The kind this handler accepts.
    pub kind: NotificationKind,
    /// Human-readable name for logs and debugging.
    pub name: &'static str,
    /// Callback that applies the notification.
    pub apply: ApplyFn,
}

impl core::fmt::Debug for NotificationHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationHandler")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Errors emitted while building a handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A handler for this kind was already registered.
    #[error("duplicate handler for notification kind {0:?}")]
    DuplicateHandler(NotificationKind),
}

const KIND_COUNT: usize = 7;

fn slot(kind: NotificationKind) -> usize {
    match kind {
        NotificationKind::NodeCreated => 0,
        NotificationKind::NodeUpdated => 1,
        NotificationKind::NodeDeleted => 2,
        NotificationKind::ChildAssocCreated => 3,
        NotificationKind::ChildAssocDeleted => 4,
        NotificationKind::PeerAssocCreated => 5,
        NotificationKind::PeerAssocDeleted => 6,
    }
}

/// Immutable-after-construction dispatch table.
#[derive(Debug, Default)]
pub struct HandlerTable {
    entries: [Option<NotificationHandler>; KIND_COUNT],
}

impl HandlerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for its kind.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateHandler`] when the kind already has
    /// a handler.
    pub fn register(&mut self, handler: NotificationHandler) -> Result<(), RegistryError> {
        let entry = &mut self.entries[slot(handler.kind)];
        if entry.is_some() {
            return Err(RegistryError::DuplicateHandler(handler.kind));
        }
        *entry = Some(handler);
        Ok(())
    }

    /// Looks up the handler for `kind`.
    #[must_use]
    pub fn handler(&self, kind: NotificationKind) -> Option<&NotificationHandler> {
        self.entries[slot(kind)].as_ref()
    }

    /// Applies `notice` to `consolidator` through the registered handler.
    ///
    /// An unregistered kind is logged and ignored — an incomplete table is a
    /// wiring mistake, not a reason to disturb the host transaction.
    pub fn apply(&self, consolidator: &mut Consolidator, notice: &Notice) {
        match self.handler(notice.kind) {
            Some(handler) => (handler.apply)(consolidator, notice),
            None => warn!(kind = ?notice.kind, "no handler registered for notification kind"),
        }
    }

    /// Builds the standard table covering all seven kinds.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        let handlers = [
            NotificationHandler {
                kind: NotificationKind::NodeCreated,
                name: "node/created",
                apply: apply_node_kind,
            },
            NotificationHandler {
                kind: NotificationKind::NodeUpdated,
                name: "node/updated",
                apply: apply_node_update,
            },
            NotificationHandler {
                kind: NotificationKind::NodeDeleted,
                name: "node/deleted",
                apply: apply_node_kind,
            },
            NotificationHandler {
                kind: NotificationKind::ChildAssocCreated,
                name: "child-assoc/created",
                apply: apply_assoc_kind,
            },
            NotificationHandler {
                kind: NotificationKind::ChildAssocDeleted,
                name: "child-assoc/deleted",
                apply: apply_assoc_kind,
            },
            NotificationHandler {
                kind: NotificationKind::PeerAssocCreated,
                name: "peer-assoc/created",
                apply: apply_assoc_kind,
            },
            NotificationHandler {
                kind: NotificationKind::PeerAssocDeleted,
                name: "peer-assoc/deleted",
                apply: apply_assoc_kind,
            },
        ];
        for handler in handlers {
            // The literal list above holds one entry per kind; duplicates
            // are impossible here by construction.
            let _ = table.register(handler);
        }
        table
    }
}

fn apply_node_kind(consolidator: &mut Consolidator, notice: &Notice) {
    if let Some(node) = consolidator.as_node_mut() {
        node.observe(notice.kind);
    } else {
        warn!(kind = ?notice.kind, "node notification routed to a non-node consolidator");
    }
}

fn apply_node_update(consolidator: &mut Consolidator, notice: &Notice) {
    if let Some(node) = consolidator.as_node_mut() {
        node.observe(notice.kind);
        match &notice.detail {
            NoticeDetail::AspectAdded(aspect) => node.add_aspect(aspect.clone()),
            NoticeDetail::AspectRemoved(aspect) => node.remove_aspect(aspect.clone()),
            NoticeDetail::None => {}
        }
    } else {
        warn!(kind = ?notice.kind, "node notification routed to a non-node consolidator");
    }
}

fn apply_assoc_kind(consolidator: &mut Consolidator, notice: &Notice) {
    if let Some(assoc) = consolidator.as_assoc_mut() {
        assoc.observe(notice.kind);
    } else {
        warn!(kind = ?notice.kind, "association notification routed to a non-assoc consolidator");
    }
}
