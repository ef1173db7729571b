//! Consistent hashing ring for deterministic segment placement.
//!
//! Each storage node is placed on a u64 ring at
//! `BE_u64(SHA256(addr)[0..8])`. A key's owner is the member with the
//! smallest position ≥ the key's own hash, wrapping to the smallest
//! member when the key hashes past every node. The hash function is part
//! of the wire-visible protocol — it decides which node receives which
//! key — so it must not change.
//!
//! The ring itself is a plain data structure; the router wraps it in a
//! read/write lock and the admin coordinator is its only writer.

mod ring;

pub use ring::{Ring, RingError, hash64};
