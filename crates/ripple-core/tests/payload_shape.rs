// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Wire-shape checks: the JSON a downstream consumer actually sees.

use std::sync::Arc;

use ripple_core::mem::{MemNode, MemStore};
use ripple_core::{
    EventCoordinator, Filters, NodeRef, PeerAssocInfo, QName, TxnContext, TxnId, VecPublisher,
};
use serde_json::Value;

fn q(s: &str) -> QName {
    QName::parse(s).expect("well-formed qname")
}

fn emit_one(drive: impl FnOnce(&EventCoordinator, &Arc<MemStore>, &mut TxnContext)) -> Value {
    let store = Arc::new(MemStore::new());
    let publisher = Arc::new(VecPublisher::new());
    let coordinator = EventCoordinator::new(
        store.clone(),
        store.clone(),
        Arc::new(Filters::default()),
        publisher.clone(),
        "urn:repo:test",
    );
    let mut ctx = TxnContext::new(TxnId::from_raw(99), "jdoe");
    drive(&coordinator, &store, &mut ctx);
    coordinator.flush(ctx);
    let events = publisher.take();
    assert_eq!(events.len(), 1);
    serde_json::to_value(&events[0]).expect("event serializes")
}

#[test]
fn node_created_event_json_shape() {
    let json = emit_one(|coordinator, store, ctx| {
        let node = NodeRef::new("n-1");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content"))
                .with_property(q("cm:title"), "hello")
                .with_aspect(q("cm:titled")),
        );
        coordinator.on_create(ctx, &node);
    });

    assert_eq!(json["type"], "node.Created");
    assert_eq!(json["source"], "urn:repo:test");
    assert_eq!(json["principal"], "jdoe");
    assert_eq!(json["txn"], 99);
    // UUID and ISO-8601 envelope fields.
    assert_eq!(json["id"].as_str().unwrap().len(), 36);
    assert!(json["time"].as_str().unwrap().contains('T'));

    let resource = &json["resource"];
    assert_eq!(resource["kind"], "node");
    assert_eq!(resource["id"], "n-1");
    assert!(resource["before"].is_null());
    assert_eq!(resource["after"]["node_type"], "cm:content");
    assert_eq!(resource["after"]["properties"]["cm:title"], "hello");
    assert_eq!(resource["after"]["aspects"][0], "cm:titled");
    // Empty update-only fields are omitted entirely.
    assert!(resource.get("properties_changed").is_none());
}

#[test]
fn node_updated_event_json_shape() {
    let json = emit_one(|coordinator, store, ctx| {
        let node = NodeRef::new("n-2");
        store.put_node(
            node.clone(),
            MemNode::new(q("cm:content")).with_property(q("cm:title"), "old"),
        );
        coordinator.on_update(ctx, &node);
        store.set_property(&node, q("cm:title"), "new");
        coordinator.on_add_aspect(ctx, &node, &q("cm:versionable"));
        store.add_aspect(&node, q("cm:versionable"));
    });

    assert_eq!(json["type"], "node.Updated");
    let resource = &json["resource"];
    assert_eq!(resource["properties_changed"][0]["name"], "cm:title");
    assert_eq!(resource["properties_changed"][0]["old"], "old");
    assert_eq!(resource["properties_changed"][0]["new"], "new");
    assert_eq!(resource["aspects_added"][0], "cm:versionable");
    // Before-state aspects were reconstructed by inverting the net delta.
    assert!(resource["before"]["aspects"]
        .as_array()
        .unwrap()
        .is_empty());
    assert_eq!(resource["after"]["aspects"][0], "cm:versionable");
}

#[test]
fn assoc_event_json_shape() {
    let json = emit_one(|coordinator, _store, ctx| {
        coordinator.on_peer_assoc_create(
            ctx,
            &PeerAssocInfo {
                assoc: ripple_core::AssocRef::new("a-1"),
                assoc_type: q("cm:references"),
                source: NodeRef::new("n-src"),
                target: NodeRef::new("n-tgt"),
            },
        );
    });

    assert_eq!(json["type"], "peerAssoc.Created");
    let resource = &json["resource"];
    assert_eq!(resource["kind"], "assoc");
    assert_eq!(resource["id"], "a-1");
    assert_eq!(resource["assoc_type"], "cm:references");
    assert_eq!(resource["source"], "n-src");
    assert_eq!(resource["target"], "n-tgt");
}
