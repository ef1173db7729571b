//! TritonTube storage node.
//!
//! [`StorageServer`] serves a [`SegmentStore`](tube_store::SegmentStore)
//! over the framed wire protocol: one task per accepted connection, each
//! processing put/get/delete/list requests in order. The node validates
//! keys, never retries, and maps every I/O failure to the internal error
//! kind.

mod server;

pub use server::StorageServer;
