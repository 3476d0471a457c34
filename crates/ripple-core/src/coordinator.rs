// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transaction event coordination: routing, intake filtering, flush.
//!
//! The coordinator is process-wide and stateless across transactions; all
//! per-transaction state lives in an explicit [`TxnContext`] the host threads
//! through every notification call. Commit maps to [`EventCoordinator::flush`]
//! — which consumes the context, so a transaction can be flushed at most once
//! — and rollback maps to dropping the context, so an aborted transaction
//! can never leak events. A host that retries a transaction from scratch
//! simply constructs a fresh context; stale state is discarded, never merged.

use std::sync::Arc;

use indexmap::IndexMap;
use ripple_proto::{RepoEvent, Resource};
use tracing::{debug, trace, warn};

use crate::assoc::{AssocClass, AssocConsolidator, AssocEnds, ChildAssocInfo, PeerAssocInfo};
use crate::consolidator::{Consolidator, NodeConsolidator};
use crate::dispatch::HandlerTable;
use crate::filter::{Filters, NameFilter};
use crate::ident::{EntityRef, NodeRef, QName, TxnId};
use crate::notification::{Notice, NoticeDetail, NotificationKind};
use crate::publish::EventPublisher;
use crate::snapshot::SnapshotFactory;
use crate::store::{EntityStore, TypeDictionary};

/// Per-transaction consolidation state.
///
/// Exclusively owned by the transaction's thread; the borrow checker stands
/// in for the locking a transaction-local map would otherwise need. The
/// entity map preserves insertion order — not required for correctness, but
/// it makes flush output deterministic for a given notification sequence.
#[derive(Debug)]
pub struct TxnContext {
    txn: TxnId,
    principal: String,
    entries: IndexMap<EntityRef, Consolidator>,
}

impl TxnContext {
    /// Opens consolidation state for one transaction attempt.
    #[must_use]
    pub fn new(txn: TxnId, principal: impl Into<String>) -> Self {
        Self {
            txn,
            principal: principal.into(),
            entries: IndexMap::new(),
        }
    }

    /// The transaction correlation id.
    #[must_use]
    pub fn txn(&self) -> TxnId {
        self.txn
    }

    /// The acting principal recorded on every flushed event.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Number of entities currently being consolidated.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no notification has survived intake yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome counts for one transaction flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Events handed to the publisher.
    pub emitted: usize,
    /// Entities consolidated away (temporary entities, empty logs).
    pub suppressed: usize,
    /// Entities dropped because their flush-time snapshot failed.
    pub snapshot_failures: usize,
    /// Events built but rejected by the publisher.
    pub publish_failures: usize,
}

/// Routes raw lifecycle notifications into per-entity consolidators and
/// flushes one finalized event per surviving entity after commit.
///
/// One coordinator serves every transaction in the process; it holds only
/// read-only collaborators (filters, snapshot factory, publisher, handler
/// table) and is safe to share behind an `Arc`.
pub struct EventCoordinator {
    source: String,
    filters: Arc<Filters>,
    factory: SnapshotFactory,
    publisher: Arc<dyn EventPublisher>,
    handlers: HandlerTable,
}

impl EventCoordinator {
    /// Creates a coordinator with the standard handler table.
    ///
    /// `source` identifies the producing repository on every event.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        dictionary: Arc<dyn TypeDictionary>,
        filters: Arc<Filters>,
        publisher: Arc<dyn EventPublisher>,
        source: impl Into<String>,
    ) -> Self {
        Self::with_handler_table(
            store,
            dictionary,
            filters,
            publisher,
            source,
            HandlerTable::standard(),
        )
    }

    /// Creates a coordinator with an explicit handler table.
    #[must_use]
    pub fn with_handler_table(
        store: Arc<dyn EntityStore>,
        dictionary: Arc<dyn TypeDictionary>,
        filters: Arc<Filters>,
        publisher: Arc<dyn EventPublisher>,
        source: impl Into<String>,
        handlers: HandlerTable,
    ) -> Self {
        let factory = SnapshotFactory::new(store, dictionary, filters.clone());
        Self {
            source: source.into(),
            filters,
            factory,
            publisher,
            handlers,
        }
    }

    /// The snapshot factory this coordinator flushes through.
    #[must_use]
    pub fn factory(&self) -> &SnapshotFactory {
        &self.factory
    }

    // ── node intake ─────────────────────────────────────────────────

    /// A node was created.
    pub fn on_create(&self, ctx: &mut TxnContext, node: &NodeRef) {
        self.node_notice(ctx, node, Notice::bare(NotificationKind::NodeCreated), false);
    }

    /// A node's properties are changing.
    ///
    /// The first update-class notification for a node captures its before
    /// snapshot, so the host must deliver it ahead of the transaction's
    /// first mutation of that node for the captured state to be pre-change.
    pub fn on_update(&self, ctx: &mut TxnContext, node: &NodeRef) {
        self.node_notice(ctx, node, Notice::bare(NotificationKind::NodeUpdated), true);
    }

    /// An aspect was attached to a node. Consolidates as an update.
    pub fn on_add_aspect(&self, ctx: &mut TxnContext, node: &NodeRef, aspect: &QName) {
        self.node_notice(
            ctx,
            node,
            Notice {
                kind: NotificationKind::NodeUpdated,
                detail: NoticeDetail::AspectAdded(aspect.clone()),
            },
            true,
        );
    }

    /// An aspect was detached from a node. Consolidates as an update.
    pub fn on_remove_aspect(&self, ctx: &mut TxnContext, node: &NodeRef, aspect: &QName) {
        self.node_notice(
            ctx,
            node,
            Notice {
                kind: NotificationKind::NodeUpdated,
                detail: NoticeDetail::AspectRemoved(aspect.clone()),
            },
            true,
        );
    }

    /// A node is about to be deleted. The pre-delete snapshot is captured
    /// here, while the node still exists — a delete event never reads the
    /// store at flush time.
    pub fn on_before_delete(&self, ctx: &mut TxnContext, node: &NodeRef) {
        self.node_notice(ctx, node, Notice::bare(NotificationKind::NodeDeleted), true);
    }

    // ── association intake ──────────────────────────────────────────

    /// A child association was created. `is_new_node` marks the containment
    /// created alongside a brand-new child; that containment is part of the
    /// child's own created event and produces no association event.
    pub fn on_child_assoc_create(
        &self,
        ctx: &mut TxnContext,
        info: &ChildAssocInfo,
        is_new_node: bool,
    ) {
        if is_new_node {
            trace!(assoc = %info.assoc, "dropping containment of a newly created node");
            return;
        }
        self.assoc_notice(
            ctx,
            AssocClass::Child,
            info.ends(),
            info.is_primary,
            NotificationKind::ChildAssocCreated,
        );
    }

    /// A child association is about to be deleted.
    pub fn on_before_child_assoc_delete(&self, ctx: &mut TxnContext, info: &ChildAssocInfo) {
        self.assoc_notice(
            ctx,
            AssocClass::Child,
            info.ends(),
            info.is_primary,
            NotificationKind::ChildAssocDeleted,
        );
    }

    /// A peer association was created.
    pub fn on_peer_assoc_create(&self, ctx: &mut TxnContext, info: &PeerAssocInfo) {
        self.assoc_notice(
            ctx,
            AssocClass::Peer,
            info.ends(),
            false,
            NotificationKind::PeerAssocCreated,
        );
    }

    /// A peer association is about to be deleted.
    pub fn on_before_peer_assoc_delete(&self, ctx: &mut TxnContext, info: &PeerAssocInfo) {
        self.assoc_notice(
            ctx,
            AssocClass::Peer,
            info.ends(),
            false,
            NotificationKind::PeerAssocDeleted,
        );
    }

    // ── flush ───────────────────────────────────────────────────────

    /// Flushes the transaction: one event per surviving entity, in entity
    /// insertion order, handed to the publisher.
    ///
    /// Consuming the context is the single-flush guarantee. Per-entity
    /// failures (vanished snapshots, publish rejections) are logged and
    /// counted; they never stop the remaining entities from flushing and
    /// can never reach the already-committed host transaction.
    pub fn flush(&self, ctx: TxnContext) -> FlushStats {
        let TxnContext {
            txn,
            principal,
            entries,
        } = ctx;
        let mut stats = FlushStats::default();
        for (entity, consolidator) in entries {
            match consolidator {
                Consolidator::Node(node) => match node.into_event(&self.factory) {
                    Ok(Some((kind, resource))) => {
                        self.emit(kind, Resource::Node(resource), &principal, txn, &mut stats);
                    }
                    Ok(None) => stats.suppressed += 1,
                    Err(err) => {
                        warn!(%entity, %err, "dropping event: snapshot unavailable at flush");
                        stats.snapshot_failures += 1;
                    }
                },
                Consolidator::Assoc(assoc) => match assoc.into_event() {
                    Some((kind, resource)) => {
                        self.emit(kind, Resource::Assoc(resource), &principal, txn, &mut stats);
                    }
                    None => stats.suppressed += 1,
                },
            }
        }
        debug!(%txn, ?stats, "transaction flush complete");
        stats
    }

    // ── internals ───────────────────────────────────────────────────

    fn node_notice(
        &self,
        ctx: &mut TxnContext,
        node: &NodeRef,
        notice: Notice,
        wants_before: bool,
    ) {
        let key = EntityRef::Node(node.clone());
        if !ctx.entries.contains_key(&key) {
            // Intake boundary: the type filter is consulted once, before the
            // consolidator exists. A filtered node never round-trips through
            // consolidation, no matter how many notifications follow.
            let Some(node_type) = self.factory.store().current_type(node) else {
                trace!(%node, "dropping notification for unknown node");
                return;
            };
            if self.filters.types.is_excluded(&node_type) {
                trace!(%node, %node_type, "dropping notification for excluded type");
                return;
            }
            ctx.entries
                .insert(key.clone(), Consolidator::Node(NodeConsolidator::new(node.clone())));
        }
        let Some(consolidator) = ctx.entries.get_mut(&key) else {
            return;
        };
        if wants_before {
            self.ensure_before(consolidator, node);
        }
        self.handlers.apply(consolidator, &notice);
    }

    fn assoc_notice(
        &self,
        ctx: &mut TxnContext,
        class: AssocClass,
        ends: AssocEnds,
        is_primary: bool,
        kind: NotificationKind,
    ) {
        if is_primary {
            trace!(assoc = %ends.assoc, "dropping primary association notification");
            return;
        }
        if self.filters.types.is_excluded(&ends.assoc_type) {
            trace!(assoc = %ends.assoc, assoc_type = %ends.assoc_type, "dropping reserved association type");
            return;
        }
        let key = EntityRef::Assoc(ends.assoc.clone());
        let consolidator = ctx
            .entries
            .entry(key)
            .or_insert_with(|| Consolidator::Assoc(AssocConsolidator::new(class, ends)));
        self.handlers.apply(consolidator, &Notice::bare(kind));
    }

    /// Captures the pre-change snapshot the first time an update-class
    /// notification arrives. At most one store read per entity happens here;
    /// the only other read is the flush-time after-snapshot.
    fn ensure_before(&self, consolidator: &mut Consolidator, node: &NodeRef) {
        if let Some(n) = consolidator.as_node_mut() {
            if !n.has_before() {
                match self.factory.capture(node) {
                    Ok(snapshot) => n.set_before(snapshot),
                    Err(err) => {
                        warn!(%node, %err, "before-snapshot capture failed; delta will be partial");
                    }
                }
            }
        }
    }

    fn emit(
        &self,
        kind: NotificationKind,
        resource: Resource,
        principal: &str,
        txn: TxnId,
        stats: &mut FlushStats,
    ) {
        let event = RepoEvent::stamped(
            kind.event_type(),
            self.source.clone(),
            principal,
            txn.value(),
            resource,
        );
        match self.publisher.publish(event) {
            Ok(()) => stats.emitted += 1,
            Err(err) => {
                warn!(%err, "publish failed for consolidated event");
                stats.publish_failures += 1;
            }
        }
    }
}

impl core::fmt::Debug for EventCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventCoordinator")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
