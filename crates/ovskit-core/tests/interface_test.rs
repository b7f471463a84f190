#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeOvsdb, connect, settle};
use ovskit_core::{CoreError, InterfaceSpec, InterfaceType, Switch};
use pretty_assertions::assert_eq;
use uuid::Uuid;

// ── Helpers ─────────────────────────────────────────────────────────

async fn switch_with_port(fake: &FakeOvsdb) -> Switch<FakeOvsdb> {
    let switch = connect(fake).await;
    switch.create_bridge("br0").await.unwrap();
    switch.create_internal_port("br0", "p1", 0).await.unwrap();
    settle(&switch, |s| s.port_by_name("p1").is_some()).await;
    switch
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_interface_links_it_to_the_port() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;

    let added = switch
        .add_internal_interface_on_port("p1", "p1-extra")
        .await
        .unwrap();

    let (uuid, _) = fake.find("Interface", "p1-extra").unwrap();
    assert_eq!(added, uuid);
    settle(&switch, |s| {
        s.port_by_name("p1")
            .is_some_and(|p| p.interfaces.contains(&added))
    })
    .await;
    let uuids = switch.find_all_interface_uuids_on_port("p1").unwrap();
    assert_eq!(uuids.len(), 2);
    assert!(uuids.contains(&added));
}

#[tokio::test]
async fn test_peer_and_veth_interfaces_carry_their_type() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;

    switch
        .add_peer_interface_on_port("p1", "p1-peer", "remote-end")
        .await
        .unwrap();
    switch
        .add_veth_interface_on_port("p1", "eth9")
        .await
        .unwrap();
    settle(&switch, |s| {
        s.interface_by_name("p1-peer").is_some() && s.interface_by_name("eth9").is_some()
    })
    .await;

    let peer = switch.store().interface_by_name("p1-peer").unwrap();
    assert_eq!(peer.kind, InterfaceType::Peer);
    assert_eq!(peer.peer(), Some("remote-end"));
    let veth = switch.store().interface_by_name("eth9").unwrap();
    assert_eq!(veth.kind, InterfaceType::System);
    assert_eq!(switch.interfaces_on_port("p1").unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_interface_with_custom_options() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;

    let spec = InterfaceSpec::new("gre0", InterfaceType::Other("gre".into()))
        .with_option("remote_ip", "192.0.2.7");
    switch.add_interface_on_port("p1", &spec).await.unwrap();
    settle(&switch, |s| s.interface_by_name("gre0").is_some()).await;

    let gre = switch.store().interface_by_name("gre0").unwrap();
    assert_eq!(gre.kind, InterfaceType::Other("gre".into()));
    assert_eq!(
        gre.options.get("remote_ip").map(String::as_str),
        Some("192.0.2.7")
    );
}

#[tokio::test]
async fn test_add_interface_on_missing_port_fails() {
    let fake = FakeOvsdb::new();
    let switch = connect(&fake).await;

    let err = switch
        .add_internal_interface_on_port("ghost", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PortNotFound { ref name } if name == "ghost"));
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_remove_interface_from_port() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;
    let extra = switch
        .add_internal_interface_on_port("p1", "p1-extra")
        .await
        .unwrap();

    switch.remove_interface_from_port("p1", extra).await.unwrap();

    assert!(fake.find("Interface", "p1-extra").is_none());
    settle(&switch, |s| s.interface_by_key(&extra).is_none()).await;
    settle(&switch, |s| {
        s.port_by_name("p1").is_some_and(|p| p.interfaces.len() == 1)
    })
    .await;
}

#[tokio::test]
async fn test_last_interface_cannot_be_removed() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;
    let only = switch.find_all_interface_uuids_on_port("p1").unwrap()[0];
    let writes = fake.writes().len();

    let err = switch.remove_interface_from_port("p1", only).await.unwrap_err();
    assert!(matches!(err, CoreError::LastInterface { .. }));
    assert_eq!(fake.writes().len(), writes);
    assert!(fake.find("Interface", "p1").is_some());
}

#[tokio::test]
async fn test_removing_foreign_interface_is_noop() {
    let fake = FakeOvsdb::new();
    let switch = switch_with_port(&fake).await;
    let writes = fake.writes().len();

    switch
        .remove_interface_from_port("p1", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(fake.writes().len(), writes);
}
