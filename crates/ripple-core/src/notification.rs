// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Raw notification kinds and the append-only observation log.
//!
//! A consolidator never mutates or reorders what it has seen: every incoming
//! notification appends one [`NotificationKind`] to an [`ObservedLog`], and
//! the precedence/temporariness decisions at flush time are pure reads over
//! the finished log.

use ripple_proto::EventType;

use crate::ident::QName;

/// The closed set of raw lifecycle notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A node was created.
    NodeCreated,
    /// A node's type, properties, or aspects changed.
    NodeUpdated,
    /// A node is about to be deleted.
    NodeDeleted,
    /// A parent/child association was created.
    ChildAssocCreated,
    /// A parent/child association is about to be deleted.
    ChildAssocDeleted,
    /// A peer association was created.
    PeerAssocCreated,
    /// A peer association is about to be deleted.
    PeerAssocDeleted,
}

impl NotificationKind {
    /// Maps the kind to the outbound wire event type.
    #[must_use]
    pub fn event_type(self) -> EventType {
        match self {
            Self::NodeCreated => EventType::NodeCreated,
            Self::NodeUpdated => EventType::NodeUpdated,
            Self::NodeDeleted => EventType::NodeDeleted,
            Self::ChildAssocCreated => EventType::ChildAssocCreated,
            Self::ChildAssocDeleted => EventType::ChildAssocDeleted,
            Self::PeerAssocCreated => EventType::PeerAssocCreated,
            Self::PeerAssocDeleted => EventType::PeerAssocDeleted,
        }
    }
}

/// Precedence list for node events: first kind present in the observed set
/// wins. A delete outranks a create outranks an update.
pub const NODE_EVENT_PRECEDENCE: [NotificationKind; 3] = [
    NotificationKind::NodeDeleted,
    NotificationKind::NodeCreated,
    NotificationKind::NodeUpdated,
];

/// Precedence list for child-association events.
pub const CHILD_ASSOC_PRECEDENCE: [NotificationKind; 2] = [
    NotificationKind::ChildAssocDeleted,
    NotificationKind::ChildAssocCreated,
];

/// Precedence list for peer-association events.
pub const PEER_ASSOC_PRECEDENCE: [NotificationKind; 2] = [
    NotificationKind::PeerAssocDeleted,
    NotificationKind::PeerAssocCreated,
];

/// Append-only log of the notification kinds observed for one entity.
///
/// Duplicates are retained in delivery order. The log is only ever appended
/// to; consumers read it once the transaction has finished accumulating.
#[derive(Debug, Clone, Default)]
pub struct ObservedLog {
    kinds: Vec<NotificationKind>,
}

impl ObservedLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observed kind.
    pub fn record(&mut self, kind: NotificationKind) {
        self.kinds.push(kind);
    }

    /// Returns `true` when nothing has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Returns the number of observations, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns the first observed kind, if any.
    #[must_use]
    pub fn earliest(&self) -> Option<NotificationKind> {
        self.kinds.first().copied()
    }

    /// Returns the most recently observed kind, if any.
    #[must_use]
    pub fn last(&self) -> Option<NotificationKind> {
        self.kinds.last().copied()
    }

    /// Returns `true` when `kind` was observed at least once.
    #[must_use]
    pub fn contains(&self, kind: NotificationKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Returns the observations in delivery order.
    #[must_use]
    pub fn as_slice(&self) -> &[NotificationKind] {
        &self.kinds
    }
}

/// Intake payload accompanying one raw notification.
///
/// Most notifications carry no detail beyond their kind; aspect notifications
/// name the aspect being toggled.
#[derive(Debug, Clone)]
pub struct Notice {
    /// The raw notification kind.
    pub kind: NotificationKind,
    /// Kind-specific detail.
    pub detail: NoticeDetail,
}

impl Notice {
    /// A detail-free notice of `kind`.
    #[must_use]
    pub fn bare(kind: NotificationKind) -> Self {
        Self {
            kind,
            detail: NoticeDetail::None,
        }
    }
}

/// Kind-specific notification detail.
#[derive(Debug, Clone)]
pub enum NoticeDetail {
    /// No detail.
    None,
    /// An aspect was attached to the node.
    AspectAdded(QName),
    /// An aspect was detached from the node.
    AspectRemoved(QName),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_delivery_order_and_duplicates() {
        let mut log = ObservedLog::new();
        log.record(NotificationKind::NodeCreated);
        log.record(NotificationKind::NodeUpdated);
        log.record(NotificationKind::NodeUpdated);
        assert_eq!(log.len(), 3);
        assert_eq!(log.earliest(), Some(NotificationKind::NodeCreated));
        assert_eq!(log.last(), Some(NotificationKind::NodeUpdated));
        assert!(log.contains(NotificationKind::NodeUpdated));
        assert!(!log.contains(NotificationKind::NodeDeleted));
    }

    #[test]
    fn kind_maps_onto_wire_event_type() {
        assert_eq!(
            NotificationKind::NodeCreated.event_type().as_str(),
            "node.Created"
        );
        assert_eq!(
            NotificationKind::PeerAssocDeleted.event_type().as_str(),
            "peerAssoc.Deleted"
        );
    }
}
