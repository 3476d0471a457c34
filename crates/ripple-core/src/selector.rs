// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Precedence selection: one event type out of many observed kinds.
use tracing::warn;

use crate::notification::{NotificationKind, ObservedLog};

/// Selects the single event kind to emit for `log`.
///
/// Walks `precedence` in order and returns the first kind the log observed.
/// When none of the precedence entries were observed — the log contains only
/// kinds outside the caller's known set — the earliest-observed kind is
/// returned as a fallback and a soft warning is logged, since this indicates
/// an unanticipated notification kind reached the consolidator.
///
/// Returns `None` only for an empty log. The function is deterministic: the
/// same log and precedence list always produce the same selection, which is
/// what keeps the one-event-per-entity contract reproducible when the host
/// retries a transaction from scratch.
#[must_use]
pub fn select_event_kind(
    log: &ObservedLog,
    precedence: &[NotificationKind],
) -> Option<NotificationKind> {
    if log.is_empty() {
        return None;
    }
    for kind in precedence {
        if log.contains(*kind) {
            return Some(*kind);
        }
    }
    let fallback = log.earliest();
    warn!(
        observed = ?log.as_slice(),
        ?precedence,
        ?fallback,
        "no observed kind matched the precedence list; falling back to earliest"
    );
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind::{
        NodeCreated, NodeDeleted, NodeUpdated, PeerAssocCreated,
    };
    use crate::notification::{NODE_EVENT_PRECEDENCE, PEER_ASSOC_PRECEDENCE};

    fn log_of(kinds: &[NotificationKind]) -> ObservedLog {
        let mut log = ObservedLog::new();
        for k in kinds {
            log.record(*k);
        }
        log
    }

    #[test]
    fn create_outranks_update() {
        let log = log_of(&[NodeCreated, NodeUpdated, NodeUpdated]);
        assert_eq!(
            select_event_kind(&log, &NODE_EVENT_PRECEDENCE),
            Some(NodeCreated)
        );
    }

    #[test]
    fn delete_outranks_everything() {
        let log = log_of(&[NodeCreated, NodeUpdated, NodeDeleted]);
        assert_eq!(
            select_event_kind(&log, &NODE_EVENT_PRECEDENCE),
            Some(NodeDeleted)
        );
    }

    #[test]
    fn update_alone_selects_update() {
        let log = log_of(&[NodeUpdated, NodeUpdated]);
        assert_eq!(
            select_event_kind(&log, &NODE_EVENT_PRECEDENCE),
            Some(NodeUpdated)
        );
    }

    #[test]
    fn empty_log_selects_nothing() {
        assert_eq!(select_event_kind(&ObservedLog::new(), &NODE_EVENT_PRECEDENCE), None);
    }

    #[test]
    fn unknown_kinds_fall_back_to_earliest_observed() {
        // A node log evaluated against the peer-assoc precedence list has no
        // match; the earliest observation wins.
        let log = log_of(&[NodeUpdated, PeerAssocCreated]);
        assert_eq!(
            select_event_kind(&log, &PEER_ASSOC_PRECEDENCE),
            Some(PeerAssocCreated)
        );
        let log = log_of(&[NodeUpdated, NodeCreated]);
        assert_eq!(
            select_event_kind(&log, &PEER_ASSOC_PRECEDENCE),
            Some(NodeUpdated)
        );
    }

    #[test]
    fn selection_is_order_independent_across_distinct_sets() {
        let a = log_of(&[NodeUpdated, NodeCreated]);
        let b = log_of(&[NodeCreated, NodeUpdated]);
        assert_eq!(
            select_event_kind(&a, &NODE_EVENT_PRECEDENCE),
            select_event_kind(&b, &NODE_EVENT_PRECEDENCE)
        );
    }
}
