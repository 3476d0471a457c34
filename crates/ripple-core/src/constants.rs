// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Well-known repository names used by filters and the snapshot factory.
use crate::ident::QName;

/// Namespace prefix for repository-internal (system) names.
pub const SYS_PREFIX: &str = "sys";

/// Namespace prefix for rendition-linkage names.
pub const RENDITION_PREFIX: &str = "rn";

/// Namespace prefix for the common content model.
pub const CM_PREFIX: &str = "cm";

/// The base file (content) type. `is_file` means "descends from this".
#[must_use]
pub fn content_type() -> QName {
    QName::new(CM_PREFIX, "content")
}

/// The base folder type. `is_folder` means "descends from this".
#[must_use]
pub fn folder_type() -> QName {
    QName::new(CM_PREFIX, "folder")
}

/// The primary-containment child association type.
///
/// Primary containment is structural, not a consumer-visible relationship;
/// intake drops it before a consolidator is ever created.
#[must_use]
pub fn contains_assoc_type() -> QName {
    QName::new(CM_PREFIX, "contains")
}

/// The rendition child association type, reserved for internal linkage.
#[must_use]
pub fn rendition_assoc_type() -> QName {
    QName::new(RENDITION_PREFIX, "rendition")
}
