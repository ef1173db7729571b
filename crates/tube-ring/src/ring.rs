//! Consistent hashing ring implementation.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Hash a string to its position on the ring.
///
/// The most-significant 8 bytes of SHA-256 over the UTF-8 bytes,
/// interpreted big-endian. Used for both node addresses and object keys.
pub fn hash64(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let bytes: [u8; 8] = digest[..8].try_into().expect("8 bytes");
    u64::from_be_bytes(bytes)
}

/// Errors from ring operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A key lookup was attempted with no registered nodes.
    #[error("no nodes registered on the ring")]
    Empty,

    /// Two distinct addresses hash to the same 64-bit position.
    ///
    /// This is a fatal configuration error; the ring never silently
    /// overwrites an existing member.
    #[error("hash collision on the ring: {addr:?} collides with {existing:?}")]
    HashCollision {
        /// The address being added.
        addr: String,
        /// The member already occupying the position.
        existing: String,
    },
}

/// Consistent hashing ring mapping object keys to node addresses.
///
/// A sorted vector of 64-bit positions with a parallel position→address
/// map. Node counts are in the tens, so lookups are O(log N) via binary
/// search and the O(N) insert/remove cost is immaterial.
#[derive(Debug, Clone, Default)]
pub struct Ring {
    /// Member positions in ascending order.
    positions: Vec<u64>,
    /// Position → node address.
    nodes: HashMap<u64, String>,
}

impl Ring {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `Ok(false)` if the address is already a
    /// member (idempotent re-add), `Ok(true)` if it was inserted.
    pub fn add(&mut self, addr: &str) -> Result<bool, RingError> {
        let position = hash64(addr);
        if let Some(existing) = self.nodes.get(&position) {
            if existing == addr {
                return Ok(false);
            }
            return Err(RingError::HashCollision {
                addr: addr.to_string(),
                existing: existing.clone(),
            });
        }

        let idx = self.positions.partition_point(|&p| p < position);
        self.positions.insert(idx, position);
        self.nodes.insert(position, addr.to_string());
        debug!(addr, position, "added node to ring");
        Ok(true)
    }

    /// Remove a node. Removing an absent address logs a warning and
    /// returns `false` rather than failing.
    pub fn remove(&mut self, addr: &str) -> bool {
        let position = hash64(addr);
        if self.nodes.get(&position).map(String::as_str) != Some(addr) {
            warn!(addr, "cannot remove node: not on the ring");
            return false;
        }
        self.nodes.remove(&position);
        if let Ok(idx) = self.positions.binary_search(&position) {
            self.positions.remove(idx);
        }
        debug!(addr, position, "removed node from ring");
        true
    }

    /// Return the owner of a key: the member with the smallest position
    /// ≥ `hash64(key)`, wrapping around to the smallest member. An exact
    /// position match is an immediate hit.
    pub fn node_for_key(&self, key: &str) -> Result<&str, RingError> {
        if self.positions.is_empty() {
            return Err(RingError::Empty);
        }
        let h = hash64(key);
        let mut idx = self.positions.partition_point(|&p| p < h);
        if idx == self.positions.len() {
            idx = 0;
        }
        Ok(self.nodes[&self.positions[idx]].as_str())
    }

    /// Whether the given address is a member.
    pub fn contains(&self, addr: &str) -> bool {
        self.nodes.get(&hash64(addr)).map(String::as_str) == Some(addr)
    }

    /// Snapshot of the members in ascending position order.
    pub fn members(&self) -> Vec<String> {
        self.positions
            .iter()
            .map(|p| self.nodes[p].clone())
            .collect()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
