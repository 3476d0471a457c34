// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for ripple repository change events.
//!
//! One [`RepoEvent`] describes the *net* effect of everything that happened to
//! a single repository entity (node or association) inside one committed
//! transaction. Producers emit at most one event per entity per transaction;
//! consumers key on `(resource id, txn)` and must not assume any cross-entity
//! emission order.
//!
//! The schema is deliberately flat serde data: no behavior beyond envelope
//! stamping lives here. Qualified names travel in their canonical
//! `prefix:local` string form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Event type discriminator carried on the wire.
///
/// Exactly seven values exist, one per consolidated lifecycle outcome. The
/// serialized form is the dotted public name (e.g. `node.Created`), which is
/// part of the consumer contract and must never change silently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A node came into durable existence in this transaction.
    #[serde(rename = "node.Created")]
    NodeCreated,
    /// A node's type, aspects, or properties changed in this transaction.
    #[serde(rename = "node.Updated")]
    NodeUpdated,
    /// A node was removed in this transaction.
    #[serde(rename = "node.Deleted")]
    NodeDeleted,
    /// A parent/child association was created.
    #[serde(rename = "childAssoc.Created")]
    ChildAssocCreated,
    /// A parent/child association was removed.
    #[serde(rename = "childAssoc.Deleted")]
    ChildAssocDeleted,
    /// A peer (source/target) association was created.
    #[serde(rename = "peerAssoc.Created")]
    PeerAssocCreated,
    /// A peer (source/target) association was removed.
    #[serde(rename = "peerAssoc.Deleted")]
    PeerAssocDeleted,
}

impl EventType {
    /// Returns the dotted public name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NodeCreated => "node.Created",
            Self::NodeUpdated => "node.Updated",
            Self::NodeDeleted => "node.Deleted",
            Self::ChildAssocCreated => "childAssoc.Created",
            Self::ChildAssocDeleted => "childAssoc.Deleted",
            Self::PeerAssocCreated => "peerAssoc.Created",
            Self::PeerAssocDeleted => "peerAssoc.Deleted",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single property value.
///
/// The repository's property model is wider than this (typed dates, content
/// references, multilingual text), but consolidation only needs value
/// equality and the empty-text rule, so the wire form stays small. Lists
/// nest arbitrarily.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Boolean(bool),
    /// 64-bit integer value.
    Integer(i64),
    /// 64-bit float value.
    Float(f64),
    /// UTF-8 text value.
    Text(String),
    /// Ordered list of values.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns `true` for a text value that is the empty string.
    ///
    /// Empty-text properties are treated as absent by snapshot filtering.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// Point-in-time state of a node as it appears in an event payload.
///
/// All maps and sets are pre-filtered by the producer: repository-internal
/// names and empty-text values never reach the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeState {
    /// Node type in `prefix:local` form.
    pub node_type: String,
    /// Whether the node's type descends from the content (file) type.
    pub is_file: bool,
    /// Whether the node's type descends from the folder type.
    pub is_folder: bool,
    /// Hierarchy path as node ids, root first, the node itself last.
    pub path: Vec<String>,
    /// Filtered property map keyed by qualified name.
    pub properties: BTreeMap<String, PropertyValue>,
    /// Filtered aspect names, sorted.
    pub aspects: Vec<String>,
}

/// Old/new pair for one property that changed in the transaction.
///
/// `old == None` means the property was introduced; `new == None` means it
/// was removed. Both present means the value changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDiff {
    /// Property qualified name in `prefix:local` form.
    pub name: String,
    /// Value before the transaction, if any.
    pub old: Option<PropertyValue>,
    /// Value after the transaction, if any.
    pub new: Option<PropertyValue>,
}

/// Resource payload for a node event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeResource {
    /// Subject node id.
    pub id: String,
    /// State before the transaction. `None` for created nodes.
    pub before: Option<NodeState>,
    /// State after the transaction. `None` for deleted nodes.
    pub after: Option<NodeState>,
    /// Properties whose value changed, with old/new pairs. Empty unless the
    /// event type is `node.Updated`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties_changed: Vec<PropertyDiff>,
    /// Aspect names attached during the transaction (net of cancellations).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aspects_added: Vec<String>,
    /// Aspect names detached during the transaction (net of cancellations).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aspects_removed: Vec<String>,
}

/// Resource payload for an association event.
///
/// For child associations `source` is the parent and `target` the child; for
/// peer associations they are the association's source and target nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssocResource {
    /// Association id.
    pub id: String,
    /// Association type in `prefix:local` form.
    pub assoc_type: String,
    /// Parent (child assoc) or source (peer assoc) node id.
    pub source: String,
    /// Child (child assoc) or target (peer assoc) node id.
    pub target: String,
}

/// Resource payload: the entity the event is about.
///
/// Internally tagged so the two shapes stay unambiguous on the wire (a node
/// payload with every optional field absent would otherwise be
/// indistinguishable from an association payload).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Resource {
    /// A node resource.
    #[serde(rename = "node")]
    Node(NodeResource),
    /// An association resource.
    #[serde(rename = "assoc")]
    Assoc(AssocResource),
}

impl Resource {
    /// Returns the subject entity id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Node(n) => &n.id,
            Self::Assoc(a) => &a.id,
        }
    }
}

/// One consolidated repository change event.
///
/// * `id` – globally unique event id (UUID v4, stamped at flush).
/// * `time` – flush wall-clock timestamp, serialized as ISO-8601.
/// * `source` – producing repository identifier.
/// * `txn` – transaction correlation id; all events flushed from the same
///   transaction carry the same value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoEvent {
    /// Globally unique event id.
    pub id: Uuid,
    /// Producing repository identifier (e.g. a repo URN).
    pub source: String,
    /// Event timestamp (ISO-8601 on the wire).
    pub time: DateTime<Utc>,
    /// Consolidated event type.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Principal whose operation produced the change.
    pub principal: String,
    /// Transaction correlation id.
    pub txn: u64,
    /// The entity the event describes.
    pub resource: Resource,
}

impl RepoEvent {
    /// Builds an event with a fresh UUID and the current wall-clock time.
    ///
    /// Everything else about the event is determined by the producer; only
    /// the envelope identity is stamped here.
    #[must_use]
    pub fn stamped(
        event_type: EventType,
        source: impl Into<String>,
        principal: impl Into<String>,
        txn: u64,
        resource: Resource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            time: Utc::now(),
            event_type,
            principal: principal.into(),
            txn,
            resource,
        }
    }
}
