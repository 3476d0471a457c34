// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Association event consolidation.
//!
//! Same shape as node consolidation with one extra rule: an association that
//! was both created and deleted inside the same transaction — in either
//! order — was never durably observable, so no event is emitted for it.

use ripple_proto::AssocResource;

use crate::ident::{AssocRef, NodeRef, QName};
use crate::notification::{
    NotificationKind, ObservedLog, CHILD_ASSOC_PRECEDENCE, PEER_ASSOC_PRECEDENCE,
};
use crate::selector::select_event_kind;

/// The two association relationship classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocClass {
    /// Parent/child containment or secondary containment.
    Child,
    /// Source/target peer relationship.
    Peer,
}

impl AssocClass {
    /// The created-notification kind for this class.
    #[must_use]
    pub fn created_kind(self) -> NotificationKind {
        match self {
            Self::Child => NotificationKind::ChildAssocCreated,
            Self::Peer => NotificationKind::PeerAssocCreated,
        }
    }

    /// The deleted-notification kind for this class.
    #[must_use]
    pub fn deleted_kind(self) -> NotificationKind {
        match self {
            Self::Child => NotificationKind::ChildAssocDeleted,
            Self::Peer => NotificationKind::PeerAssocDeleted,
        }
    }

    /// The precedence list restricted to this class's two kinds.
    #[must_use]
    pub fn precedence(self) -> &'static [NotificationKind] {
        match self {
            Self::Child => &CHILD_ASSOC_PRECEDENCE,
            Self::Peer => &PEER_ASSOC_PRECEDENCE,
        }
    }
}

/// Identity and endpoints of one association.
///
/// For child associations `source` is the parent and `target` the child; for
/// peer associations they are the association's source and target nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssocEnds {
    /// Association reference (the consolidation key).
    pub assoc: AssocRef,
    /// Association type qualified name.
    pub assoc_type: QName,
    /// Parent or source node.
    pub source: NodeRef,
    /// Child or target node.
    pub target: NodeRef,
}

/// Intake payload for a child-association notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildAssocInfo {
    /// Association reference.
    pub assoc: AssocRef,
    /// Association type qualified name.
    pub assoc_type: QName,
    /// Parent node.
    pub parent: NodeRef,
    /// Child node.
    pub child: NodeRef,
    /// Whether this is the child's primary containment association.
    pub is_primary: bool,
}

impl ChildAssocInfo {
    /// The association's identity and endpoints.
    #[must_use]
    pub fn ends(&self) -> AssocEnds {
        AssocEnds {
            assoc: self.assoc.clone(),
            assoc_type: self.assoc_type.clone(),
            source: self.parent.clone(),
            target: self.child.clone(),
        }
    }
}

/// Intake payload for a peer-association notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAssocInfo {
    /// Association reference.
    pub assoc: AssocRef,
    /// Association type qualified name.
    pub assoc_type: QName,
    /// Source node.
    pub source: NodeRef,
    /// Target node.
    pub target: NodeRef,
}

impl PeerAssocInfo {
    /// The association's identity and endpoints.
    #[must_use]
    pub fn ends(&self) -> AssocEnds {
        AssocEnds {
            assoc: self.assoc.clone(),
            assoc_type: self.assoc_type.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

/// Per-association, per-transaction accumulator.
///
/// Created on the association's first notification in a transaction,
/// appended to by every subsequent one, consumed exactly once at flush.
#[derive(Debug, Clone)]
pub struct AssocConsolidator {
    class: AssocClass,
    ends: AssocEnds,
    log: ObservedLog,
}

impl AssocConsolidator {
    /// Creates an empty consolidator for one association.
    #[must_use]
    pub fn new(class: AssocClass, ends: AssocEnds) -> Self {
        Self {
            class,
            ends,
            log: ObservedLog::new(),
        }
    }

    /// The association's relationship class.
    #[must_use]
    pub fn class(&self) -> AssocClass {
        self.class
    }

    /// Appends one observed kind.
    pub fn observe(&mut self, kind: NotificationKind) {
        self.log.record(kind);
    }

    /// The observations so far, in delivery order.
    #[must_use]
    pub fn log(&self) -> &ObservedLog {
        &self.log
    }

    /// Returns `true` when the association was created and deleted within
    /// this transaction, in either order.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.log.contains(self.class.created_kind()) && self.log.contains(self.class.deleted_kind())
    }

    /// Reduces the accumulated observations to at most one event.
    ///
    /// Returns `None` for an empty log and for temporary associations.
    #[must_use]
    pub fn into_event(self) -> Option<(NotificationKind, AssocResource)> {
        if self.is_temporary() {
            tracing::debug!(assoc = %self.ends.assoc, "suppressing temporary association");
            return None;
        }
        let kind = select_event_kind(&self.log, self.class.precedence())?;
        Some((
            kind,
            AssocResource {
                id: self.ends.assoc.as_str().to_owned(),
                assoc_type: self.ends.assoc_type.to_string(),
                source: self.ends.source.as_str().to_owned(),
                target: self.ends.target.as_str().to_owned(),
            },
        ))
    }
}
