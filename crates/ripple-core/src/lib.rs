// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ripple-core: transaction-scoped repository event consolidation.
//!
//! A content repository fires many fine-grained lifecycle notifications per
//! transaction — creates, repeated property updates, aspect toggles,
//! association changes, deletes — often several against the same entity.
//! This crate reduces each transaction's notification stream to at most one
//! consolidated event per entity, reflecting the net effect of everything
//! that happened:
//!
//! * per-entity accumulation keyed by [`EntityRef`] in an explicit
//!   [`TxnContext`] threaded through every call,
//! * a commutative, self-cancelling aspect toggle ([`AspectToggle`]) and
//!   before/after snapshot diffing ([`EntitySnapshot`]),
//! * deterministic precedence selection of the single event type
//!   ([`select_event_kind`]),
//! * suppression of temporary entities and associations that were created
//!   and destroyed inside the same transaction, and
//! * a consuming flush that publishes surviving events after commit —
//!   dropping the context instead (rollback) leaks nothing.
//!
//! The entity store, type dictionary, and outbound transport stay behind
//! traits; [`mem::MemStore`] bundles an in-memory pair of the first two so
//! the engine can run self-contained.

mod assoc;
mod consolidator;
/// Well-known repository names (content/folder types, internal namespaces).
pub mod constants;
mod coordinator;
mod delta;
mod dispatch;
mod filter;
mod ident;
/// In-memory entity store and type dictionary for tests and embedded hosts.
pub mod mem;
mod notification;
mod publish;
mod selector;
mod snapshot;
mod store;

// Re-exports for stable public API
/// Association consolidation: relationship classes, intake payloads, accumulator.
pub use assoc::{AssocClass, AssocConsolidator, AssocEnds, ChildAssocInfo, PeerAssocInfo};
/// Per-entity accumulators and the map value type.
pub use consolidator::{Consolidator, NodeConsolidator};
/// Coordination: explicit transaction context, coordinator, flush statistics.
pub use coordinator::{EventCoordinator, FlushStats, TxnContext};
/// Net-delta algebra: aspect toggles and property diffs.
pub use delta::{property_diffs, AspectToggle};
/// Notification dispatch table and registration errors.
pub use dispatch::{ApplyFn, HandlerTable, NotificationHandler, RegistryError};
/// Qualified-name exclusion filters and their configuration.
pub use filter::{FilterConfig, FilterError, Filters, NameFilter, PatternFilter};
/// Identifier types for nodes, associations, names, and transactions.
pub use ident::{AssocRef, EntityRef, NodeRef, QName, QNameParseError, TxnId};
/// Raw notification kinds, precedence lists, and the observation log.
pub use notification::{
    Notice, NoticeDetail, NotificationKind, ObservedLog, CHILD_ASSOC_PRECEDENCE,
    NODE_EVENT_PRECEDENCE, PEER_ASSOC_PRECEDENCE,
};
/// Outbound publisher seam and bundled adapters.
pub use publish::{ChannelPublisher, EventPublisher, PublishError, VecPublisher};
/// Precedence selection over an observation log.
pub use selector::select_event_kind;
/// Immutable filtered entity snapshots and their factory.
pub use snapshot::{EntitySnapshot, SnapshotError, SnapshotFactory};
/// Consumed collaborator seams: entity store and type dictionary.
pub use store::{EntityStore, TypeDictionary};
