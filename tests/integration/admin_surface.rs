//! Integration tests: the operator-facing control plane over the wire.

use bytes::Bytes;
use tokio::net::TcpListener;
use tube_cluster::AdminServer;
use tube_integration_tests::{TestCluster, spawn_node};
use tube_net::{AdminClient, AdminErrorKind, NetError};

async fn spawn_admin(c: &TestCluster) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = AdminServer::new(c.admin.clone());
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

/// ListNodes returns the members in ring order, matching the router.
#[tokio::test]
async fn test_list_nodes_over_the_wire() {
    let c = TestCluster::new(3).await;
    let admin_addr = spawn_admin(&c).await;
    let client = AdminClient::new(&admin_addr);

    assert_eq!(client.list_nodes().await.unwrap(), c.router.members().await);
}

/// A full operator session: grow the cluster, list, shrink it again.
#[tokio::test]
async fn test_operator_session() {
    let c = TestCluster::new(2).await;
    let admin_addr = spawn_admin(&c).await;
    let client = AdminClient::new(&admin_addr);

    for i in 0..8 {
        c.write(&format!("v{i}"), "manifest.mpd", format!("m{i}").as_bytes())
            .await;
    }

    let joiner = spawn_node().await;
    let migrated_in = client.add_node(&joiner.addr).await.unwrap();
    assert_eq!(joiner.store.len() as u64, migrated_in);

    let listed = client.list_nodes().await.unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.contains(&joiner.addr));

    let migrated_out = client.remove_node(&joiner.addr).await.unwrap();
    assert_eq!(migrated_out, migrated_in);
    assert!(joiner.store.is_empty());
    assert_eq!(client.list_nodes().await.unwrap().len(), 2);

    for i in 0..8 {
        assert_eq!(
            c.read(&format!("v{i}"), "manifest.mpd").await,
            Bytes::from(format!("m{i}"))
        );
    }
}

/// Precondition violations come back as structured error kinds.
#[tokio::test]
async fn test_membership_precondition_errors() {
    let c = TestCluster::new(1).await;
    let admin_addr = spawn_admin(&c).await;
    let client = AdminClient::new(&admin_addr);

    let err = client.add_node(&c.nodes[0].addr).await.unwrap_err();
    match err {
        NetError::Admin(e) => assert_eq!(e.kind, AdminErrorKind::DuplicateNode),
        other => panic!("expected DuplicateNode, got {other:?}"),
    }

    let err = client.remove_node("127.0.0.1:1").await.unwrap_err();
    match err {
        NetError::Admin(e) => assert_eq!(e.kind, AdminErrorKind::UnknownNode),
        other => panic!("expected UnknownNode, got {other:?}"),
    }

    // Empty the cluster, then AddNode has nothing to migrate from.
    client.remove_node(&c.nodes[0].addr).await.unwrap();
    let joiner = spawn_node().await;
    let err = client.add_node(&joiner.addr).await.unwrap_err();
    match err {
        NetError::Admin(e) => assert_eq!(e.kind, AdminErrorKind::EmptyCluster),
        other => panic!("expected EmptyCluster, got {other:?}"),
    }
}

/// Membership operations are serialized: two concurrent AddNode calls
/// both complete, and both nodes end up in the ring.
#[tokio::test]
async fn test_concurrent_membership_changes_serialize() {
    let c = TestCluster::new(1).await;
    let admin_addr = spawn_admin(&c).await;

    for i in 0..10 {
        c.write(&format!("v{i}"), "manifest.mpd", format!("m{i}").as_bytes())
            .await;
    }

    let joiner_a = spawn_node().await;
    let joiner_b = spawn_node().await;
    let (addr_a, addr_b) = (joiner_a.addr.clone(), joiner_b.addr.clone());

    let admin_a = admin_addr.clone();
    let task_a = tokio::spawn(async move {
        AdminClient::new(&admin_a).add_node(&addr_a).await.unwrap();
    });
    let admin_b = admin_addr.clone();
    let task_b = tokio::spawn(async move {
        AdminClient::new(&admin_b).add_node(&addr_b).await.unwrap();
    });
    task_a.await.unwrap();
    task_b.await.unwrap();

    let members = c.router.members().await;
    assert_eq!(members.len(), 3);
    assert!(members.contains(&joiner_a.addr));
    assert!(members.contains(&joiner_b.addr));

    for i in 0..10 {
        assert_eq!(
            c.read(&format!("v{i}"), "manifest.mpd").await,
            Bytes::from(format!("m{i}"))
        );
    }
}
