//! Wire protocol and RPC clients for the TritonTube content plane.
//!
//! Every RPC travels as a length-prefixed postcard frame over a plain TCP
//! connection:
//!
//! - [`StorageRequest`] / [`StorageResponse`] — the storage node surface
//!   (put / get / delete / list).
//! - [`AdminRequest`] / [`AdminResponse`] — the operator control plane
//!   (list-nodes / add-node / remove-node).
//! - [`StorageClient`] / [`AdminClient`] — one pooled connection per
//!   remote, dialled lazily and re-dialled after a transport failure.

mod client;
mod codec;
mod error;
mod message;

pub use client::{AdminClient, StorageClient};
pub use codec::{MAX_FRAME_SIZE, read_frame, write_frame};
pub use error::NetError;
pub use message::{
    AdminErrorKind, AdminRequest, AdminResponse, AdminWireError, StorageErrorKind, StorageRequest,
    StorageResponse, StorageWireError,
};
