//! Integration tests: routed writes and reads.

use bytes::Bytes;
use tube_cluster::RouterError;
use tube_integration_tests::TestCluster;
use tube_net::{NetError, StorageClient, StorageErrorKind};

/// Single-node cluster: one write, one read, same bytes.
#[tokio::test]
async fn test_single_node_write_read() {
    let c = TestCluster::new(1).await;
    c.write("v1", "manifest.mpd", b"m").await;
    assert_eq!(c.read("v1", "manifest.mpd").await, Bytes::from_static(b"m"));
}

/// Writes spread across a 3-node cluster; every key reads back and lives
/// on exactly the node the ring picks for it.
#[tokio::test]
async fn test_writes_land_on_ring_selected_nodes() {
    let c = TestCluster::new(3).await;
    let members = c.router.members().await;

    for i in 0..30 {
        c.write(&format!("v{i}"), "manifest.mpd", format!("m{i}").as_bytes())
            .await;
    }

    let mut total = 0;
    for node in &c.nodes {
        total += node.store.len();
    }
    assert_eq!(total, 30, "each segment stored on exactly one node");

    for i in 0..30 {
        let key = format!("v{i}/manifest.mpd");
        let owner = TestCluster::owner_under(&members, &key);
        let keys = c.router.list_segments(&owner).await.unwrap();
        assert!(keys.contains(&key), "{key} missing from its owner {owner}");
    }
}

/// Re-writing a key overwrites: last writer wins.
#[tokio::test]
async fn test_rewrite_overwrites() {
    let c = TestCluster::new(2).await;
    c.write("v1", "chunk-0-00001.m4s", b"old").await;
    c.write("v1", "chunk-0-00001.m4s", b"new").await;
    assert_eq!(
        c.read("v1", "chunk-0-00001.m4s").await,
        Bytes::from_static(b"new")
    );
}

/// Reading an unwritten key fails with the not-found kind.
#[tokio::test]
async fn test_read_missing_is_not_found() {
    let c = TestCluster::new(2).await;
    let err = c.router.read("v1", "never-written.m4s").await.unwrap_err();
    assert!(matches!(err, RouterError::NotFound { .. }));
}

/// A malformed key is rejected by the storage node and leaves no state
/// behind.
#[tokio::test]
async fn test_malformed_key_rejected_cluster_unchanged() {
    let c = TestCluster::new(2).await;
    let client = StorageClient::new(&c.nodes[0].addr);

    let err = client
        .put("nosplit", Bytes::from_static(b"x"))
        .await
        .unwrap_err();
    match err {
        NetError::Remote(e) => assert_eq!(e.kind, StorageErrorKind::MalformedKey),
        other => panic!("expected remote MalformedKey, got {other:?}"),
    }

    for node in &c.nodes {
        assert!(node.store.is_empty());
    }
    assert_eq!(c.router.members().await.len(), 2);
}

/// Many concurrent writers and readers through the shared router.
#[tokio::test]
async fn test_concurrent_writes_and_reads() {
    let c = TestCluster::new(3).await;

    let mut handles = Vec::new();
    for w in 0..8 {
        let router = c.router.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..20 {
                let data = Bytes::from(format!("writer {w} segment {i}"));
                router
                    .write(&format!("v{w}"), &format!("chunk-{i:05}.m4s"), data.clone())
                    .await
                    .unwrap();
                let got = router
                    .read(&format!("v{w}"), &format!("chunk-{i:05}.m4s"))
                    .await
                    .unwrap();
                assert_eq!(got, data);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

/// Filenames with nested paths survive the trip intact.
#[tokio::test]
async fn test_nested_filenames() {
    let c = TestCluster::new(2).await;
    c.write("v1", "segments/audio/chunk-00001.m4s", b"audio").await;
    assert_eq!(
        c.read("v1", "segments/audio/chunk-00001.m4s").await,
        Bytes::from_static(b"audio")
    );

    // The composed key splits on the first slash only.
    let members = c.router.members().await;
    let owner = TestCluster::owner_under(&members, "v1/segments/audio/chunk-00001.m4s");
    let keys = c.router.list_segments(&owner).await.unwrap();
    assert!(keys.contains(&"v1/segments/audio/chunk-00001.m4s".to_string()));
}
