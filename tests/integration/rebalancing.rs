//! Integration tests: AddNode / RemoveNode migrations.

use bytes::Bytes;
use tube_integration_tests::{TestCluster, spawn_node};
use tube_net::StorageClient;

/// Seed one node, write three keys, add a second node. The migrated
/// count equals the number of keys the grown ring assigns
/// to the new node, and all three keys stay readable.
#[tokio::test]
async fn test_add_node_migrated_count() {
    let c = TestCluster::new(1).await;
    let seed = c.router.members().await;

    for name in ["a", "b", "c"] {
        c.write("v1", name, format!("data {name}").as_bytes()).await;
    }

    let joiner = spawn_node().await;
    let mut grown = seed.clone();
    grown.push(joiner.addr.clone());
    let expected = ["a", "b", "c"]
        .iter()
        .filter(|name| TestCluster::owner_under(&grown, &format!("v1/{name}")) == joiner.addr)
        .count() as u64;

    let migrated = c.admin.add_node(&joiner.addr).await.unwrap();
    assert_eq!(migrated, expected);
    assert_eq!(joiner.store.len() as u64, migrated);

    for name in ["a", "b", "c"] {
        assert_eq!(
            c.read("v1", name).await,
            Bytes::from(format!("data {name}"))
        );
    }
}

/// Seed two nodes, write ten keys, remove one. The migrated count
/// equals the keys it held, and its store drains to empty while
/// everything stays readable.
#[tokio::test]
async fn test_remove_node_drains() {
    let c = TestCluster::new(2).await;

    for i in 0..10 {
        c.write(&format!("v{i}"), "manifest.mpd", format!("m{i}").as_bytes())
            .await;
    }

    let victim_addr = c.nodes[1].addr.clone();
    let victim_held = c.node(&victim_addr).store.len() as u64;
    let migrated = c.admin.remove_node(&victim_addr).await.unwrap();
    assert_eq!(migrated, victim_held);

    // The node is still reachable (it just left the ring); its listing
    // must come back empty.
    let listed = StorageClient::new(&victim_addr).list().await.unwrap();
    assert!(listed.is_empty(), "drained node still lists {listed:?}");

    for i in 0..10 {
        assert_eq!(
            c.read(&format!("v{i}"), "manifest.mpd").await,
            Bytes::from(format!("m{i}"))
        );
    }
}

/// Adding a node and then removing it restores every byte.
#[tokio::test]
async fn test_add_then_remove_round_trip() {
    let c = TestCluster::new(2).await;

    let mut written = Vec::new();
    for i in 1..=10 {
        let data = format!("segment {i}");
        c.write("v1", &format!("k{i}"), data.as_bytes()).await;
        written.push((format!("k{i}"), data));
    }

    let transient = spawn_node().await;
    let moved_in = c.admin.add_node(&transient.addr).await.unwrap();
    let moved_out = c.admin.remove_node(&transient.addr).await.unwrap();

    // Everything the joiner received it must hand back on departure.
    assert_eq!(moved_out, moved_in);
    assert!(transient.store.is_empty());

    for (filename, data) in &written {
        assert_eq!(c.read("v1", filename).await, Bytes::from(data.clone()));
    }
}

/// Membership changes under data: grow 1 → 3 nodes, shrink back to 1,
/// verifying every key after each step.
#[tokio::test]
async fn test_grow_and_shrink_cluster() {
    let c = TestCluster::new(1).await;

    let mut written = Vec::new();
    for i in 0..25 {
        let data = format!("clip {i}");
        c.write(&format!("v{i}"), "manifest.mpd", data.as_bytes())
            .await;
        written.push((format!("v{i}"), data));
    }

    async fn verify(c: &TestCluster, written: &[(String, String)]) {
        for (video_id, data) in written {
            assert_eq!(
                c.read(video_id, "manifest.mpd").await,
                Bytes::from(data.clone())
            );
        }
    }

    let second = spawn_node().await;
    c.admin.add_node(&second.addr).await.unwrap();
    verify(&c, &written).await;

    let third = spawn_node().await;
    c.admin.add_node(&third.addr).await.unwrap();
    verify(&c, &written).await;

    c.admin.remove_node(&second.addr).await.unwrap();
    verify(&c, &written).await;
    assert!(second.store.is_empty());

    c.admin.remove_node(&third.addr).await.unwrap();
    verify(&c, &written).await;
    assert!(third.store.is_empty());

    // Everything is back on the seed node.
    assert_eq!(c.nodes[0].store.len(), 25);
}

/// Readers racing a migration always see either the old copy or the new
/// one — bytes are never wrong, and every key reads fine afterwards.
#[tokio::test]
async fn test_reads_racing_add_node() {
    let c = TestCluster::new(2).await;

    for i in 0..40 {
        c.write(&format!("v{i}"), "manifest.mpd", format!("m{i}").as_bytes())
            .await;
    }

    let joiner = spawn_node().await;
    let reader = {
        let router = c.router.clone();
        tokio::spawn(async move {
            for round in 0..5 {
                for i in 0..40 {
                    // A read racing the copy may transiently miss; it must
                    // never return the wrong bytes.
                    if let Ok(data) = router.read(&format!("v{i}"), "manifest.mpd").await {
                        assert_eq!(data, Bytes::from(format!("m{i}")), "round {round}");
                    }
                }
            }
        })
    };

    c.admin.add_node(&joiner.addr).await.unwrap();
    reader.await.unwrap();

    for i in 0..40 {
        assert_eq!(
            c.read(&format!("v{i}"), "manifest.mpd").await,
            Bytes::from(format!("m{i}"))
        );
    }
}
