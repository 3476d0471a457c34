// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node event consolidation: diff algebra over one node in one transaction.
use ripple_proto::NodeResource;
use tracing::debug;

use crate::assoc::AssocConsolidator;
use crate::delta::{property_diffs, AspectToggle};
use crate::ident::{NodeRef, QName};
use crate::notification::{NotificationKind, ObservedLog, NODE_EVENT_PRECEDENCE};
use crate::selector::select_event_kind;
use crate::snapshot::{EntitySnapshot, SnapshotError, SnapshotFactory};

/// Per-node, per-transaction accumulator.
///
/// Lifecycle: created on the node's first notification within a transaction,
/// mutated by every subsequent notification for that node, consumed exactly
/// once at flush (by value), then gone — a consolidator never crosses a
/// transaction boundary.
#[derive(Debug, Clone)]
pub struct NodeConsolidator {
    node: NodeRef,
    log: ObservedLog,
    toggle: AspectToggle,
    before: Option<EntitySnapshot>,
}

impl NodeConsolidator {
    /// Creates an empty consolidator for `node`.
    #[must_use]
    pub fn new(node: NodeRef) -> Self {
        Self {
            node,
            log: ObservedLog::new(),
            toggle: AspectToggle::new(),
            before: None,
        }
    }

    /// The node this consolidator tracks.
    #[must_use]
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Appends one observed kind to the log.
    pub fn observe(&mut self, kind: NotificationKind) {
        self.log.record(kind);
    }

    /// Records an aspect attach in the toggle algebra.
    pub fn add_aspect(&mut self, aspect: QName) {
        self.toggle.add(aspect);
    }

    /// Records an aspect detach in the toggle algebra.
    pub fn remove_aspect(&mut self, aspect: QName) {
        self.toggle.remove(aspect);
    }

    /// The observations so far, in delivery order.
    #[must_use]
    pub fn log(&self) -> &ObservedLog {
        &self.log
    }

    /// The accumulated net aspect delta.
    #[must_use]
    pub fn toggle(&self) -> &AspectToggle {
        &self.toggle
    }

    /// Returns `true` when a before-snapshot has been captured.
    #[must_use]
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Stores the lazily captured pre-change snapshot. First capture wins;
    /// later calls are ignored so "before" always means "before this
    /// transaction touched the node".
    pub fn set_before(&mut self, snapshot: EntitySnapshot) {
        if self.before.is_none() {
            self.before = Some(snapshot);
        }
    }

    /// Returns `true` when the node's entire existence was transient within
    /// this transaction: it was created here and the last thing observed was
    /// its deletion. Nothing durable remains for a consumer to reconcile.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.log.contains(NotificationKind::NodeCreated)
            && self.log.last() == Some(NotificationKind::NodeDeleted)
    }

    /// Reduces the accumulated observations to at most one event.
    ///
    /// Suppression and selection happen first (no I/O); the single
    /// after-snapshot read only happens for events that will actually emit.
    ///
    /// # Errors
    /// Returns [`SnapshotError`] when the flush-time snapshot is required
    /// (created/updated events) but the node has vanished. The caller treats
    /// this as a per-entity failure and keeps flushing other entities.
    pub fn into_event(
        self,
        factory: &SnapshotFactory,
    ) -> Result<Option<(NotificationKind, NodeResource)>, SnapshotError> {
        if self.log.is_empty() {
            return Ok(None);
        }
        if self.is_temporary() {
            debug!(node = %self.node, "suppressing temporary node");
            return Ok(None);
        }
        let Some(kind) = select_event_kind(&self.log, &NODE_EVENT_PRECEDENCE) else {
            return Ok(None);
        };

        let id = self.node.as_str().to_owned();
        let resource = match kind {
            NotificationKind::NodeDeleted => NodeResource {
                id,
                before: self.before.as_ref().map(EntitySnapshot::to_wire),
                after: None,
                properties_changed: vec![],
                aspects_added: vec![],
                aspects_removed: vec![],
            },
            NotificationKind::NodeCreated => {
                let after = factory.capture(&self.node)?;
                NodeResource {
                    id,
                    before: None,
                    after: Some(after.to_wire()),
                    properties_changed: vec![],
                    aspects_added: vec![],
                    aspects_removed: vec![],
                }
            }
            _ => {
                let after = factory.capture(&self.node)?;
                let toggle = self.toggle.filtered(&factory.filters().aspects);
                let before_aspects = toggle.reconstruct_before(after.aspects());
                // The lazily captured snapshot provides pre-change property
                // values; when capture never happened (or failed and was
                // skipped), the delta degrades to empty rather than guessing.
                let before_props = self
                    .before
                    .as_ref()
                    .map_or_else(|| after.properties().clone(), |b| b.properties().clone());
                let properties_changed = property_diffs(&before_props, after.properties());
                let before_state = self
                    .before
                    .as_ref()
                    .unwrap_or(&after)
                    .to_wire_with_aspects(&before_aspects);
                NodeResource {
                    id,
                    before: Some(before_state),
                    after: Some(after.to_wire()),
                    properties_changed,
                    aspects_added: toggle.added().iter().map(ToString::to_string).collect(),
                    aspects_removed: toggle.removed().iter().map(ToString::to_string).collect(),
                }
            }
        };
        Ok(Some((kind, resource)))
    }
}

/// A node or association consolidator: the value type of the per-transaction
/// entity map. One variant per entity class, created on first sight of the
/// entity and matched against the incoming notification kind by the handler
/// table.
#[derive(Debug, Clone)]
pub enum Consolidator {
    /// Node accumulator.
    Node(NodeConsolidator),
    /// Association accumulator.
    Assoc(AssocConsolidator),
}

impl Consolidator {
    /// Returns the node accumulator, if this is one.
    #[must_use]
    pub fn as_node_mut(&mut self) -> Option<&mut NodeConsolidator> {
        match self {
            Self::Node(n) => Some(n),
            Self::Assoc(_) => None,
        }
    }

    /// Returns the association accumulator, if this is one.
    #[must_use]
    pub fn as_assoc_mut(&mut self) -> Option<&mut AssocConsolidator> {
        match self {
            Self::Node(_) => None,
            Self::Assoc(a) => Some(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filters;
    use crate::mem::{MemNode, MemStore};
    use crate::notification::NotificationKind::{NodeCreated, NodeDeleted, NodeUpdated};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn q(s: &str) -> QName {
        QName::parse(s).unwrap()
    }

    fn harness() -> (Arc<MemStore>, SnapshotFactory) {
        let store = Arc::new(MemStore::new());
        let factory =
            SnapshotFactory::new(store.clone(), store.clone(), Arc::new(Filters::default()));
        (store, factory)
    }

    #[test]
    fn create_update_delete_in_one_txn_is_suppressed() {
        let (_, factory) = harness();
        let mut c = NodeConsolidator::new(NodeRef::new("n-1"));
        c.observe(NodeCreated);
        c.observe(NodeUpdated);
        c.observe(NodeDeleted);
        assert!(c.is_temporary());
        assert!(c.into_event(&factory).unwrap().is_none());
    }

    #[test]
    fn created_node_emits_created_with_after_state() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-2");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_property(q("cm:title"), "t"),
        );
        let mut c = NodeConsolidator::new(node);
        c.observe(NodeCreated);
        c.observe(NodeUpdated);
        let (kind, resource) = c.into_event(&factory).unwrap().unwrap();
        assert_eq!(kind, NodeCreated);
        assert!(resource.before.is_none());
        let after = resource.after.unwrap();
        assert_eq!(after.node_type, "cm:content");
        assert!(resource.properties_changed.is_empty());
    }

    #[test]
    fn deleted_node_emits_before_state_without_store_reads() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-3");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_aspect(q("cm:titled")),
        );
        let mut c = NodeConsolidator::new(node.clone());
        c.set_before(factory.capture(&node).unwrap());
        c.observe(NodeDeleted);
        // The node is gone by flush time; the delete event must not care.
        store.remove_node(&node);
        let (kind, resource) = c.into_event(&factory).unwrap().unwrap();
        assert_eq!(kind, NodeDeleted);
        assert!(resource.after.is_none());
        assert_eq!(resource.before.unwrap().aspects, vec!["cm:titled"]);
    }

    #[test]
    fn update_carries_property_and_aspect_delta() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-4");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_property(q("cm:title"), "old"),
        );
        let mut c = NodeConsolidator::new(node.clone());
        c.set_before(factory.capture(&node).unwrap());
        c.observe(NodeUpdated);
        c.add_aspect(q("cm:versionable"));
        store.set_property(&node, q("cm:title"), "new");
        store.add_aspect(&node, q("cm:versionable"));

        let (kind, resource) = c.into_event(&factory).unwrap().unwrap();
        assert_eq!(kind, NodeUpdated);
        assert_eq!(resource.aspects_added, vec!["cm:versionable"]);
        assert!(resource.aspects_removed.is_empty());
        assert_eq!(resource.properties_changed.len(), 1);
        assert_eq!(resource.properties_changed[0].old, Some("old".into()));
        assert_eq!(resource.properties_changed[0].new, Some("new".into()));
        // Before-state aspects are the inverted net delta.
        assert!(resource.before.unwrap().aspects.is_empty());
        assert_eq!(resource.after.unwrap().aspects, vec!["cm:versionable"]);
    }

    #[test]
    fn update_flush_fails_when_node_vanished() {
        let (_, factory) = harness();
        let node = NodeRef::new("n-5");
        let mut c = NodeConsolidator::new(node.clone());
        c.observe(NodeUpdated);
        assert_eq!(
            c.into_event(&factory),
            Err(SnapshotError::NotFound(node))
        );
    }

    #[test]
    fn filtered_aspects_never_reach_the_delta() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-6");
        store.put_node(node.clone(), MemNode::new(q("cm:content")));
        let mut c = NodeConsolidator::new(node.clone());
        c.set_before(factory.capture(&node).unwrap());
        c.observe(NodeUpdated);
        c.add_aspect(q("sys:hidden"));
        store.add_aspect(&node, q("sys:hidden"));
        let (_, resource) = c.into_event(&factory).unwrap().unwrap();
        assert!(resource.aspects_added.is_empty());
    }

    #[test]
    fn before_capture_is_first_wins() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-7");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_property(q("cm:title"), "first"),
        );
        let mut c = NodeConsolidator::new(node.clone());
        c.set_before(factory.capture(&node).unwrap());
        store.set_property(&node, q("cm:title"), "second");
        c.set_before(factory.capture(&node).unwrap());
        c.observe(NodeUpdated);
        store.set_property(&node, q("cm:title"), "third");
        let (_, resource) = c.into_event(&factory).unwrap().unwrap();
        assert_eq!(resource.properties_changed[0].old, Some("first".into()));
        assert_eq!(resource.properties_changed[0].new, Some("third".into()));
    }

    #[test]
    fn cancelled_aspect_pair_leaves_before_equal_to_after() {
        let (store, factory) = harness();
        let node = NodeRef::new("n-8");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_aspect(q("cm:titled")),
        );
        let mut c = NodeConsolidator::new(node.clone());
        c.set_before(factory.capture(&node).unwrap());
        c.observe(NodeUpdated);
        c.add_aspect(q("cm:versionable"));
        c.remove_aspect(q("cm:versionable"));
        let (_, resource) = c.into_event(&factory).unwrap().unwrap();
        let before: BTreeSet<String> = resource.before.unwrap().aspects.into_iter().collect();
        let after: BTreeSet<String> = resource.after.unwrap().aspects.into_iter().collect();
        assert_eq!(before, after);
        assert!(resource.aspects_added.is_empty());
        assert!(resource.aspects_removed.is_empty());
    }
}
