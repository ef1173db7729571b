//! Membership administration and segment migration.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tube_types::ObjectKey;

use crate::router::{ContentRouter, RouterError};

/// Errors from membership operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// AddNode was called with no existing members to migrate from. The
    /// operator seeds the cluster at startup instead.
    #[error("cluster has no nodes to migrate from")]
    EmptyCluster,

    /// The address is already a member.
    #[error("node already in the ring: {addr}")]
    DuplicateNode {
        /// The offending `host:port`.
        addr: String,
    },

    /// The address is not a member.
    #[error("node not in the ring: {addr}")]
    UnknownNode {
        /// The offending `host:port`.
        addr: String,
    },

    /// The migration batch stopped on a per-segment failure.
    ///
    /// Segments moved before the failure stay at their new owners; the
    /// state is consistent because every delete-from-source followed a
    /// successful write to the destination.
    #[error("migration aborted after {migrated} segments: {source}")]
    Aborted {
        /// Segments successfully moved before the failure.
        migrated: u64,
        /// The failure that stopped the batch.
        #[source]
        source: RouterError,
    },

    /// A failure outside the per-segment loop (e.g. the initial listing).
    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Single-writer coordinator over the (ring, channel map, node contents)
/// triple.
///
/// One exclusive lock serializes every membership operation; only one
/// AddNode or RemoveNode is in flight at a time, and ListNodes snapshots
/// under the same discipline.
pub struct AdminCoordinator {
    router: Arc<ContentRouter>,
    op_lock: Mutex<()>,
}

impl AdminCoordinator {
    /// Create a coordinator mutating the given router's membership.
    pub fn new(router: Arc<ContentRouter>) -> Self {
        Self {
            router,
            op_lock: Mutex::new(()),
        }
    }

    /// Current members in ring order.
    pub async fn list_nodes(&self) -> Vec<String> {
        let _guard = self.op_lock.lock().await;
        self.router.members().await
    }

    /// Add a node and migrate every segment the updated ring assigns
    /// away from its current holder. Returns the migrated count.
    pub async fn add_node(&self, new_addr: &str) -> Result<u64, AdminError> {
        let _guard = self.op_lock.lock().await;

        if self.router.contains(new_addr).await {
            return Err(AdminError::DuplicateNode {
                addr: new_addr.to_string(),
            });
        }
        let members = self.router.members().await;
        if members.is_empty() {
            return Err(AdminError::EmptyCluster);
        }

        // Insert first: the ownership test below must use the
        // post-insertion ring, which is exactly what concurrent readers
        // see. A reader finds each segment either still on the old node
        // or already on its new owner, never on neither, because the
        // delete happens after the write.
        self.router.insert_node(new_addr).await?;
        info!(addr = new_addr, "node added to ring, migrating segments");

        let mut migrated = 0u64;
        for addr in &members {
            let keys = self
                .router
                .list_segments(addr)
                .await
                .map_err(|source| AdminError::Aborted { migrated, source })?;

            for key in keys {
                let owner = self
                    .router
                    .owner_of(&key)
                    .await
                    .map_err(|source| AdminError::Aborted { migrated, source })?;
                if owner == *addr {
                    continue;
                }
                self.migrate(&key, addr)
                    .await
                    .map_err(|source| AdminError::Aborted { migrated, source })?;
                info!(%key, from = %addr, to = %owner, "migrated segment");
                migrated += 1;
            }
        }

        info!(addr = new_addr, migrated, "node added");
        Ok(migrated)
    }

    /// Drain and remove a node. Returns the number of segments moved off
    /// it.
    pub async fn remove_node(&self, addr: &str) -> Result<u64, AdminError> {
        let _guard = self.op_lock.lock().await;

        if !self.router.contains(addr).await {
            return Err(AdminError::UnknownNode {
                addr: addr.to_string(),
            });
        }

        // List while the node is still a member, then take it out of the
        // ring so the writes below route to the post-removal owners and
        // never back to the departing node.
        let keys = self.router.list_segments(addr).await?;
        self.router.remove_from_ring(addr).await;
        info!(addr, segments = keys.len(), "node removed from ring, draining");

        let mut migrated = 0u64;
        for key in keys {
            self.migrate(&key, addr)
                .await
                .map_err(|source| AdminError::Aborted { migrated, source })?;
            migrated += 1;
        }

        // The channel outlived the ring entry for the drain; on an abort
        // it stays open so the node's remaining segments are reachable
        // for recovery.
        self.router.drop_channel(addr).await;
        info!(addr, migrated, "node drained and removed");
        Ok(migrated)
    }

    /// Move one segment off `from`: read from the holder, write via the
    /// updated ring, then delete the source copy.
    async fn migrate(&self, key: &str, from: &str) -> Result<(), RouterError> {
        let parsed = ObjectKey::parse(key).map_err(|e| {
            warn!(%key, from, "unparseable key in node listing");
            RouterError::Key(e)
        })?;
        let data = self
            .router
            .read_from(from, parsed.video_id(), parsed.filename())
            .await?;
        self.router
            .write(parsed.video_id(), parsed.filename(), data)
            .await?;
        self.router
            .delete_from(from, parsed.video_id(), parsed.filename())
            .await?;
        Ok(())
    }
}
