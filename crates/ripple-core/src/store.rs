// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Consumed collaborator interfaces: entity store and type dictionary.
//!
//! Consolidation only ever *reads* through these seams, and it does so at
//! most twice per entity per transaction (a lazy before-capture and the
//! flush-time after-capture). Implementations are expected to provide their
//! own interior safety for concurrent readers; ripple adds no locking.

use std::collections::{BTreeMap, BTreeSet};

use ripple_proto::PropertyValue;

use crate::ident::{NodeRef, QName};

/// Read-only view of current repository node state.
///
/// Every method returns `None` when the node does not exist — the entity may
/// legitimately vanish between notification time and flush time when another
/// transaction deletes it.
pub trait EntityStore: Send + Sync {
    /// Returns `true` when the node currently exists.
    fn exists(&self, node: &NodeRef) -> bool;

    /// Current type of the node.
    fn current_type(&self, node: &NodeRef) -> Option<QName>;

    /// Current full (unfiltered) aspect set of the node.
    fn current_aspects(&self, node: &NodeRef) -> Option<BTreeSet<QName>>;

    /// Current full (unfiltered) property map of the node.
    fn current_properties(&self, node: &NodeRef) -> Option<BTreeMap<QName, PropertyValue>>;

    /// Current hierarchy path as node ids, root first, `node` itself last.
    fn current_path(&self, node: &NodeRef) -> Option<Vec<NodeRef>>;
}

/// Sub-typing oracle of the repository's type system.
pub trait TypeDictionary: Send + Sync {
    /// Returns `true` when `ty` is `ancestor` or descends from it.
    fn is_subtype(&self, ty: &QName, ancestor: &QName) -> bool;
}
