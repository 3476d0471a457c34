// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types: qualified names, entity references, transaction ids.
use thiserror::Error;

/// Error returned when parsing a qualified name from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QNameParseError {
    /// The string contained no `:` separator.
    #[error("missing ':' separator in qualified name: {0:?}")]
    MissingSeparator(String),
    /// The prefix or local part was empty.
    #[error("empty prefix or local name in qualified name: {0:?}")]
    EmptyPart(String),
}

/// A qualified name: namespace prefix plus local name, rendered `prefix:local`.
///
/// Qualified names identify node types, aspects, properties, and association
/// types. They are plain value types — ordering is lexicographic over
/// `(prefix, local)`, which keeps every derived `BTreeSet`/`BTreeMap`
/// iteration deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    prefix: String,
    local: String,
}

impl QName {
    /// Constructs a qualified name from its two parts.
    #[must_use]
    pub fn new(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            local: local.into(),
        }
    }

    /// Parses the canonical `prefix:local` form.
    ///
    /// # Errors
    /// Returns [`QNameParseError`] when the separator is missing or either
    /// part is empty. Additional `:` characters are treated as part of the
    /// local name.
    pub fn parse(s: &str) -> Result<Self, QNameParseError> {
        let (prefix, local) = s
            .split_once(':')
            .ok_or_else(|| QNameParseError::MissingSeparator(s.to_owned()))?;
        if prefix.is_empty() || local.is_empty() {
            return Err(QNameParseError::EmptyPart(s.to_owned()));
        }
        Ok(Self::new(prefix, local))
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl core::fmt::Display for QName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

/// Opaque reference to a repository node.
///
/// The id is host-supplied and never interpreted; it only needs to be stable
/// within the transaction and unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(String);

impl NodeRef {
    /// Wraps a host-supplied node id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque reference to an association between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssocRef(String);

impl AssocRef {
    /// Wraps a host-supplied association id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AssocRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssocRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The unit of consolidation: a node or an association.
///
/// `EntityRef` is the key of the per-transaction consolidator map; one
/// consolidator exists per distinct value per transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityRef {
    /// A node entity.
    Node(NodeRef),
    /// An association entity.
    Assoc(AssocRef),
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Node(n) => write!(f, "node:{n}"),
            Self::Assoc(a) => write!(f, "assoc:{a}"),
        }
    }
}

/// Thin wrapper around a transaction correlation identifier.
///
/// The host transaction manager issues these; ripple only copies the value
/// into every event flushed for the transaction. Zero is permitted but
/// conventionally unused.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TxnId(u64);

impl TxnId {
    /// Constructs a `TxnId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for TxnId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_parse_round_trips() {
        let q = QName::parse("cm:title").unwrap();
        assert_eq!(q.prefix(), "cm");
        assert_eq!(q.local_name(), "title");
        assert_eq!(q.to_string(), "cm:title");
    }

    #[test]
    fn qname_parse_keeps_extra_separators_in_local_name() {
        let q = QName::parse("sys:a:b").unwrap();
        assert_eq!(q.local_name(), "a:b");
    }

    #[test]
    fn qname_parse_rejects_malformed_input() {
        assert!(matches!(
            QName::parse("noseparator"),
            Err(QNameParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            QName::parse(":x"),
            Err(QNameParseError::EmptyPart(_))
        ));
        assert!(matches!(
            QName::parse("cm:"),
            Err(QNameParseError::EmptyPart(_))
        ));
    }

    #[test]
    fn entity_refs_compare_by_value() {
        let a = EntityRef::Node(NodeRef::new("n-1"));
        let b = EntityRef::Node(NodeRef::new("n-1"));
        let c = EntityRef::Assoc(AssocRef::new("n-1"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
