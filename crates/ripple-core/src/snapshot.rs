// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entity snapshots: immutable, filtered, point-in-time views.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ripple_proto::{NodeState, PropertyValue};
use thiserror::Error;

use crate::constants::{content_type, folder_type};
use crate::filter::{Filters, NameFilter};
use crate::ident::{NodeRef, QName};
use crate::store::{EntityStore, TypeDictionary};

/// Error produced when a snapshot cannot be captured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The entity no longer exists in the store.
    #[error("node not found: {0}")]
    NotFound(NodeRef),
}

/// Immutable, filtered view of one node at capture time.
///
/// Snapshots are produced fresh on every request and never mutated. The
/// property map excludes filtered names and empty-text values; the aspect set
/// excludes filtered names; `path` runs root-to-self inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    node: NodeRef,
    node_type: QName,
    is_file: bool,
    is_folder: bool,
    path: Vec<NodeRef>,
    properties: BTreeMap<QName, PropertyValue>,
    aspects: BTreeSet<QName>,
}

impl EntitySnapshot {
    /// The node this snapshot describes.
    #[must_use]
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The node's type at capture time.
    #[must_use]
    pub fn node_type(&self) -> &QName {
        &self.node_type
    }

    /// Whether the type descends from the content (file) type.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.is_file
    }

    /// Whether the type descends from the folder type.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    /// Hierarchy path, root first, this node last.
    #[must_use]
    pub fn path(&self) -> &[NodeRef] {
        &self.path
    }

    /// Filtered property map.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<QName, PropertyValue> {
        &self.properties
    }

    /// Filtered aspect set.
    #[must_use]
    pub fn aspects(&self) -> &BTreeSet<QName> {
        &self.aspects
    }

    /// Renders the snapshot into its wire form.
    #[must_use]
    pub fn to_wire(&self) -> NodeState {
        NodeState {
            node_type: self.node_type.to_string(),
            is_file: self.is_file,
            is_folder: self.is_folder,
            path: self.path.iter().map(|n| n.as_str().to_owned()).collect(),
            properties: self
                .properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            aspects: self.aspects.iter().map(ToString::to_string).collect(),
        }
    }

    /// Renders the wire form with `aspects` substituted, leaving everything
    /// else as captured. Used to express a reconstructed before-state.
    #[must_use]
    pub fn to_wire_with_aspects(&self, aspects: &BTreeSet<QName>) -> NodeState {
        let mut state = self.to_wire();
        state.aspects = aspects.iter().map(ToString::to_string).collect();
        state
    }
}

/// Produces filtered [`EntitySnapshot`]s from the live store.
#[derive(Clone)]
pub struct SnapshotFactory {
    store: Arc<dyn EntityStore>,
    dictionary: Arc<dyn TypeDictionary>,
    filters: Arc<Filters>,
}

impl SnapshotFactory {
    /// Creates a factory over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn EntityStore>,
        dictionary: Arc<dyn TypeDictionary>,
        filters: Arc<Filters>,
    ) -> Self {
        Self {
            store,
            dictionary,
            filters,
        }
    }

    /// Captures a filtered snapshot of `node` as it exists right now.
    ///
    /// This is the subsystem's only blocking call: the store and dictionary
    /// reads behind it may perform I/O.
    ///
    /// # Errors
    /// Returns [`SnapshotError::NotFound`] when the node has vanished —
    /// typically a concurrent delete that won the race to commit.
    pub fn capture(&self, node: &NodeRef) -> Result<EntitySnapshot, SnapshotError> {
        let not_found = || SnapshotError::NotFound(node.clone());
        let node_type = self.store.current_type(node).ok_or_else(not_found)?;
        let path = self.store.current_path(node).ok_or_else(not_found)?;
        let raw_properties = self.store.current_properties(node).ok_or_else(not_found)?;
        let raw_aspects = self.store.current_aspects(node).ok_or_else(not_found)?;

        let properties = raw_properties
            .into_iter()
            .filter(|(name, value)| {
                !self.filters.properties.is_excluded(name) && !value.is_empty_text()
            })
            .collect();
        let aspects = raw_aspects
            .into_iter()
            .filter(|name| !self.filters.aspects.is_excluded(name))
            .collect();

        Ok(EntitySnapshot {
            node: node.clone(),
            is_file: self.dictionary.is_subtype(&node_type, &content_type()),
            is_folder: self.dictionary.is_subtype(&node_type, &folder_type()),
            node_type,
            path,
            properties,
            aspects,
        })
    }

    /// The store this factory reads from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// The filters this factory applies.
    #[must_use]
    pub fn filters(&self) -> &Arc<Filters> {
        &self.filters
    }
}

impl core::fmt::Debug for SnapshotFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotFactory").finish_non_exhaustive()
    }
}
