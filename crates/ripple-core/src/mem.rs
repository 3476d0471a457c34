// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory entity store and type dictionary.
//!
//! `MemStore` keeps the engine self-contained: tests and embedded hosts can
//! drive full transactions without a backing repository. It is not a
//! production store — just enough node/aspect/property state to satisfy the
//! [`EntityStore`] and [`TypeDictionary`] seams, with `BTreeMap` backing so
//! every iteration order is deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use ripple_proto::PropertyValue;

use crate::ident::{NodeRef, QName};
use crate::store::{EntityStore, TypeDictionary};

/// One stored node: type, optional parent link, aspects, properties.
#[derive(Debug, Clone)]
pub struct MemNode {
    /// Node type.
    pub node_type: QName,
    /// Primary parent, if any. Path derivation walks these links to a root.
    pub parent: Option<NodeRef>,
    /// Unfiltered aspect set.
    pub aspects: BTreeSet<QName>,
    /// Unfiltered property map.
    pub properties: BTreeMap<QName, PropertyValue>,
}

impl MemNode {
    /// Creates a parentless node of `node_type` with no aspects or properties.
    #[must_use]
    pub fn new(node_type: QName) -> Self {
        Self {
            node_type,
            parent: None,
            aspects: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Sets the parent link.
    #[must_use]
    pub fn with_parent(mut self, parent: NodeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds one aspect.
    #[must_use]
    pub fn with_aspect(mut self, aspect: QName) -> Self {
        self.aspects.insert(aspect);
        self
    }

    /// Sets one property.
    #[must_use]
    pub fn with_property(mut self, name: QName, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name, value.into());
        self
    }
}

#[derive(Debug, Default)]
struct MemState {
    nodes: BTreeMap<NodeRef, MemNode>,
    supertypes: BTreeMap<QName, QName>,
}

/// In-memory [`EntityStore`] + [`TypeDictionary`] implementation.
///
/// Interior mutability lets the host mutate state between notifications while
/// the snapshot factory holds a shared reference. Lock poisoning is recovered
/// by adopting the inner state; the store holds no invariants a panicked
/// writer could break mid-update.
#[derive(Debug, Default)]
pub struct MemStore {
    state: RwLock<MemState>,
}

impl MemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Inserts or replaces a node.
    pub fn put_node(&self, node: NodeRef, record: MemNode) {
        self.write().nodes.insert(node, record);
    }

    /// Removes a node. Returns `true` when it existed.
    pub fn remove_node(&self, node: &NodeRef) -> bool {
        self.write().nodes.remove(node).is_some()
    }

    /// Sets one property on an existing node; no-op when the node is absent.
    pub fn set_property(&self, node: &NodeRef, name: QName, value: impl Into<PropertyValue>) {
        if let Some(record) = self.write().nodes.get_mut(node) {
            record.properties.insert(name, value.into());
        }
    }

    /// Removes one property from an existing node.
    pub fn remove_property(&self, node: &NodeRef, name: &QName) {
        if let Some(record) = self.write().nodes.get_mut(node) {
            record.properties.remove(name);
        }
    }

    /// Attaches one aspect to an existing node.
    pub fn add_aspect(&self, node: &NodeRef, aspect: QName) {
        if let Some(record) = self.write().nodes.get_mut(node) {
            record.aspects.insert(aspect);
        }
    }

    /// Detaches one aspect from an existing node.
    pub fn remove_aspect(&self, node: &NodeRef, aspect: &QName) {
        if let Some(record) = self.write().nodes.get_mut(node) {
            record.aspects.remove(aspect);
        }
    }

    /// Declares `child` a direct subtype of `parent`.
    ///
    /// The dictionary walk follows these links transitively; a type is always
    /// a subtype of itself.
    pub fn declare_subtype(&self, child: QName, parent: QName) {
        self.write().supertypes.insert(child, parent);
    }
}

impl EntityStore for MemStore {
    fn exists(&self, node: &NodeRef) -> bool {
        self.read().nodes.contains_key(node)
    }

    fn current_type(&self, node: &NodeRef) -> Option<QName> {
        self.read().nodes.get(node).map(|r| r.node_type.clone())
    }

    fn current_aspects(&self, node: &NodeRef) -> Option<BTreeSet<QName>> {
        self.read().nodes.get(node).map(|r| r.aspects.clone())
    }

    fn current_properties(&self, node: &NodeRef) -> Option<BTreeMap<QName, PropertyValue>> {
        self.read().nodes.get(node).map(|r| r.properties.clone())
    }

    fn current_path(&self, node: &NodeRef) -> Option<Vec<NodeRef>> {
        let state = self.read();
        state.nodes.get(node)?;
        let mut path = vec![node.clone()];
        let mut cursor = node.clone();
        while let Some(parent) = state.nodes.get(&cursor).and_then(|r| r.parent.clone()) {
            // A broken parent link terminates the walk rather than erroring;
            // the path is then rooted at the deepest reachable ancestor.
            if !state.nodes.contains_key(&parent) || path.contains(&parent) {
                break;
            }
            path.push(parent.clone());
            cursor = parent;
        }
        path.reverse();
        Some(path)
    }
}

impl TypeDictionary for MemStore {
    fn is_subtype(&self, ty: &QName, ancestor: &QName) -> bool {
        if ty == ancestor {
            return true;
        }
        let state = self.read();
        let mut cursor = ty.clone();
        let mut hops = 0usize;
        while let Some(parent) = state.supertypes.get(&cursor) {
            if parent == ancestor {
                return true;
            }
            // Guard against accidental cycles in test fixtures.
            hops += 1;
            if hops > state.supertypes.len() {
                return false;
            }
            cursor = parent.clone();
        }
        false
    }
}
