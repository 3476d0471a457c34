// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Net-delta algebra: aspect toggles and property diffs.
//!
//! The toggle is commutative and self-cancelling: the final
//! `(added, removed)` pair depends only on the net count of adds vs. removes
//! per name, never on call order. Intermediate state during accumulation is
//! order-dependent; the final result is not.

use std::collections::{BTreeMap, BTreeSet};

use ripple_proto::{PropertyDiff, PropertyValue};

use crate::filter::NameFilter;
use crate::ident::QName;

/// Accumulated net aspect delta for one node in one transaction.
///
/// # Invariant
/// `added ∩ removed = ∅` at all times; the toggle operations below are the
/// only mutation path and each removes from the opposite set before
/// inserting.
#[derive(Debug, Clone, Default)]
pub struct AspectToggle {
    added: BTreeSet<QName>,
    removed: BTreeSet<QName>,
}

impl AspectToggle {
    /// Creates an empty toggle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an aspect attach.
    ///
    /// Cancels a pending remove of the same name; otherwise inserts into the
    /// added set (idempotently).
    pub fn add(&mut self, aspect: QName) {
        if !self.removed.remove(&aspect) {
            self.added.insert(aspect);
        }
        debug_assert!(self.added.is_disjoint(&self.removed));
    }

    /// Records an aspect detach. Symmetric to [`AspectToggle::add`].
    pub fn remove(&mut self, aspect: QName) {
        if !self.added.remove(&aspect) {
            self.removed.insert(aspect);
        }
        debug_assert!(self.added.is_disjoint(&self.removed));
    }

    /// Net-added aspect names, sorted.
    #[must_use]
    pub fn added(&self) -> &BTreeSet<QName> {
        &self.added
    }

    /// Net-removed aspect names, sorted.
    #[must_use]
    pub fn removed(&self) -> &BTreeSet<QName> {
        &self.removed
    }

    /// Returns `true` when every toggle cancelled out.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Returns a copy with every name the filter excludes dropped from both
    /// sets. Filtered names never appear in an outbound delta.
    #[must_use]
    pub fn filtered(&self, filter: &dyn NameFilter) -> Self {
        Self {
            added: self
                .added
                .iter()
                .filter(|q| !filter.is_excluded(q))
                .cloned()
                .collect(),
            removed: self
                .removed
                .iter()
                .filter(|q| !filter.is_excluded(q))
                .cloned()
                .collect(),
        }
    }

    /// Reconstructs the pre-transaction aspect set from the post-transaction
    /// one by inverting the net delta: `(current ∪ removed) − added`.
    ///
    /// A name both added and removed in the same transaction cancelled inside
    /// the toggle, so it contributes nothing here and `before == current`
    /// for it — consistent with the algebra's path independence.
    #[must_use]
    pub fn reconstruct_before(&self, current: &BTreeSet<QName>) -> BTreeSet<QName> {
        let mut before: BTreeSet<QName> = current.union(&self.removed).cloned().collect();
        for a in &self.added {
            before.remove(a);
        }
        before
    }
}

/// Computes the old/new pairs for every property whose value differs between
/// the two (already filtered) maps.
///
/// The union of both key sets is considered; keys present on one side only
/// yield a half-open pair. Output order follows the sorted key order of the
/// underlying maps, so it is deterministic.
#[must_use]
pub fn property_diffs(
    before: &BTreeMap<QName, PropertyValue>,
    after: &BTreeMap<QName, PropertyValue>,
) -> Vec<PropertyDiff> {
    let names: BTreeSet<&QName> = before.keys().chain(after.keys()).collect();
    let mut diffs = Vec::new();
    for name in names {
        let old = before.get(name);
        let new = after.get(name);
        if old != new {
            diffs.push(PropertyDiff {
                name: name.to_string(),
                old: old.cloned(),
                new: new.cloned(),
            });
        }
    }
    diffs
}
