//! Ring-routed segment access across the cluster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;
use tube_net::{NetError, StorageClient};
use tube_ring::Ring;
use tube_types::{KeyError, ObjectKey};

/// Errors from router operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A key was routed (or the router constructed) with no registered
    /// nodes.
    #[error("no storage nodes registered")]
    NoNodes,

    /// The owning node does not hold the segment.
    #[error("segment not found: {key}")]
    NotFound {
        /// Composed key.
        key: String,
    },

    /// An explicit-node operation named an address with no channel.
    #[error("unknown storage node: {addr}")]
    UnknownNode {
        /// The `host:port` that has no channel.
        addr: String,
    },

    /// The key does not decompose into video id and filename.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Two distinct addresses hash to the same ring position.
    #[error(transparent)]
    Ring(#[from] tube_ring::RingError),

    /// Transport or remote-side failure.
    #[error("rpc failure: {0}")]
    Rpc(#[from] NetError),
}

/// Routes per-segment operations to the ring-selected storage node.
///
/// Holds one persistent [`StorageClient`] per known node. The ring and
/// the channel map are only ever mutated together, by the
/// [`AdminCoordinator`](crate::AdminCoordinator): every ring member has a
/// live channel and (outside an in-flight RemoveNode drain) vice versa.
pub struct ContentRouter {
    ring: RwLock<Ring>,
    channels: RwLock<HashMap<String, Arc<StorageClient>>>,
    rpc_timeout: Option<Duration>,
}

impl ContentRouter {
    /// Create a router over the given seed nodes.
    ///
    /// An empty seed list is a configuration error ([`RouterError::NoNodes`]).
    pub fn new<I, S>(seed_nodes: I) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_rpc_timeout(seed_nodes, None)
    }

    /// Create a router whose per-call RPCs carry a deadline.
    pub fn with_rpc_timeout<I, S>(
        seed_nodes: I,
        rpc_timeout: Option<Duration>,
    ) -> Result<Self, RouterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = Ring::new();
        let mut channels = HashMap::new();
        for addr in seed_nodes {
            let addr = addr.as_ref();
            ring.add(addr)?;
            channels
                .entry(addr.to_string())
                .or_insert_with(|| Arc::new(make_client(addr, rpc_timeout)));
        }
        if ring.is_empty() {
            return Err(RouterError::NoNodes);
        }
        Ok(Self {
            ring: RwLock::new(ring),
            channels: RwLock::new(channels),
            rpc_timeout,
        })
    }

    /// Store a segment on its current owner.
    pub async fn write(
        &self,
        video_id: &str,
        filename: &str,
        data: Bytes,
    ) -> Result<(), RouterError> {
        let key = ObjectKey::new(video_id, filename)?.to_string();
        let owner = self.owner_of(&key).await?;
        debug!(%key, %owner, "routing write");
        let client = self.channel(&owner).await?;
        client.put(&key, data).await?;
        Ok(())
    }

    /// Read a segment from its current owner.
    pub async fn read(&self, video_id: &str, filename: &str) -> Result<Bytes, RouterError> {
        let key = ObjectKey::new(video_id, filename)?.to_string();
        let owner = self.owner_of(&key).await?;
        debug!(%key, %owner, "routing read");
        let client = self.channel(&owner).await?;
        match client.get(&key).await? {
            Some(data) => Ok(data),
            None => Err(RouterError::NotFound { key }),
        }
    }

    /// Read a segment from an explicit node, bypassing the ring.
    ///
    /// Used only by the admin coordinator during migrations.
    pub async fn read_from(
        &self,
        addr: &str,
        video_id: &str,
        filename: &str,
    ) -> Result<Bytes, RouterError> {
        let key = ObjectKey::new(video_id, filename)?.to_string();
        let client = self.channel(addr).await?;
        match client.get(&key).await? {
            Some(data) => Ok(data),
            None => Err(RouterError::NotFound { key }),
        }
    }

    /// Delete a segment from an explicit node, bypassing the ring.
    ///
    /// Used only by the admin coordinator during migrations.
    pub async fn delete_from(
        &self,
        addr: &str,
        video_id: &str,
        filename: &str,
    ) -> Result<(), RouterError> {
        let key = ObjectKey::new(video_id, filename)?.to_string();
        let client = self.channel(addr).await?;
        client.delete(&key).await?;
        Ok(())
    }

    /// List every segment key an explicit node holds.
    pub async fn list_segments(&self, addr: &str) -> Result<Vec<String>, RouterError> {
        let client = self.channel(addr).await?;
        Ok(client.list().await?)
    }

    /// Snapshot of current members in ascending ring order.
    pub async fn members(&self) -> Vec<String> {
        self.ring.read().await.members()
    }

    /// Whether the address is a current member.
    pub async fn contains(&self, addr: &str) -> bool {
        self.ring.read().await.contains(addr)
    }

    /// Resolve a composed key to its owning node under the current ring.
    pub(crate) async fn owner_of(&self, key: &str) -> Result<String, RouterError> {
        let ring = self.ring.read().await;
        ring.node_for_key(key)
            .map(str::to_string)
            .map_err(|_| RouterError::NoNodes)
    }

    /// Insert a node into the ring and open its channel, atomically with
    /// respect to readers.
    pub(crate) async fn insert_node(&self, addr: &str) -> Result<(), RouterError> {
        let mut ring = self.ring.write().await;
        let mut channels = self.channels.write().await;
        ring.add(addr)?;
        channels
            .entry(addr.to_string())
            .or_insert_with(|| Arc::new(make_client(addr, self.rpc_timeout)));
        Ok(())
    }

    /// Remove a node from the ring. Its channel stays open so an
    /// in-flight drain can keep reading from it.
    pub(crate) async fn remove_from_ring(&self, addr: &str) -> bool {
        self.ring.write().await.remove(addr)
    }

    /// Tear down the channel to a node that is no longer a member.
    pub(crate) async fn drop_channel(&self, addr: &str) {
        self.channels.write().await.remove(addr);
    }

    async fn channel(&self, addr: &str) -> Result<Arc<StorageClient>, RouterError> {
        self.channels
            .read()
            .await
            .get(addr)
            .cloned()
            .ok_or_else(|| RouterError::UnknownNode {
                addr: addr.to_string(),
            })
    }
}

fn make_client(addr: &str, timeout: Option<Duration>) -> StorageClient {
    let client = StorageClient::new(addr);
    match timeout {
        Some(t) => client.with_timeout(t),
        None => client,
    }
}
