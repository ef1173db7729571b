//! Content routing and membership administration for TritonTube.
//!
//! - [`ContentRouter`] — routes per-segment reads and writes to the
//!   owning storage node via the consistent-hash ring, holding one
//!   persistent RPC channel per known node.
//! - [`AdminCoordinator`] — the single writer over the
//!   (ring, channel map, node contents) triple; drives AddNode and
//!   RemoveNode migrations one segment at a time.
//! - [`AdminServer`] — exposes ListNodes/AddNode/RemoveNode to the
//!   operator CLI over the framed wire protocol.
//! - [`ClusterOptions`] — parses the `adminAddr,node1,node2,…`
//!   configuration string.

mod admin;
mod coordinator;
mod options;
mod router;

pub use admin::AdminServer;
pub use coordinator::{AdminCoordinator, AdminError};
pub use options::{ClusterOptions, OptionsError};
pub use router::{ContentRouter, RouterError};
