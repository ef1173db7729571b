//! Shared test harness for TritonTube integration tests.
//!
//! [`TestCluster`] runs N real storage nodes (memory-backed, each behind
//! a TCP listener on `127.0.0.1:0`) plus a [`ContentRouter`] and
//! [`AdminCoordinator`] over them — the full content plane minus the
//! HTTP front-end.

use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tube_cluster::{AdminCoordinator, ContentRouter};
use tube_ring::Ring;
use tube_storage::StorageServer;
use tube_store::MemoryStore;

/// One running storage node.
pub struct TestNode {
    /// The node's `host:port`.
    pub addr: String,
    /// Direct handle on the node's store, for assertions.
    pub store: Arc<MemoryStore>,
    handle: JoinHandle<()>,
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn one memory-backed storage node on an ephemeral port.
pub async fn spawn_node() -> TestNode {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr").to_string();
    let store = Arc::new(MemoryStore::new());
    let server = StorageServer::new(store.clone());
    let handle = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    TestNode {
        addr,
        store,
        handle,
    }
}

/// An N-node cluster with its router and admin coordinator.
pub struct TestCluster {
    /// The seed nodes, in spawn order.
    pub nodes: Vec<TestNode>,
    /// The content router over the seed nodes.
    pub router: Arc<ContentRouter>,
    /// The single-writer membership coordinator.
    pub admin: Arc<AdminCoordinator>,
}

impl TestCluster {
    /// Spawn `n` storage nodes and wire a router + coordinator over them.
    pub async fn new(n: usize) -> Self {
        let mut nodes = Vec::with_capacity(n);
        for _ in 0..n {
            nodes.push(spawn_node().await);
        }
        let addrs: Vec<String> = nodes.iter().map(|node| node.addr.clone()).collect();
        let router = Arc::new(ContentRouter::new(&addrs).expect("router over seed nodes"));
        let admin = Arc::new(AdminCoordinator::new(router.clone()));
        Self {
            nodes,
            router,
            admin,
        }
    }

    /// Write one segment through the router.
    pub async fn write(&self, video_id: &str, filename: &str, data: &[u8]) {
        self.router
            .write(video_id, filename, Bytes::copy_from_slice(data))
            .await
            .expect("routed write");
    }

    /// Read one segment through the router.
    pub async fn read(&self, video_id: &str, filename: &str) -> Bytes {
        self.router
            .read(video_id, filename)
            .await
            .expect("routed read")
    }

    /// The node (by address) a fresh ring over `members` assigns `key` to.
    pub fn owner_under(members: &[String], key: &str) -> String {
        let mut ring = Ring::new();
        for addr in members {
            ring.add(addr).expect("ring add");
        }
        ring.node_for_key(key).expect("non-empty ring").to_string()
    }

    /// Find a node by address.
    pub fn node(&self, addr: &str) -> &TestNode {
        self.nodes
            .iter()
            .find(|node| node.addr == addr)
            .expect("known node")
    }
}
