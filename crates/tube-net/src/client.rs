//! RPC clients with per-node connection pooling.
//!
//! Each client owns at most one TCP connection to its remote, dialled on
//! first use and reused for every subsequent call. Calls on the same
//! client serialize on the connection; a transport failure (or an expired
//! deadline) drops the connection so the next call re-dials.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::codec::{read_frame, write_frame};
use crate::error::NetError;
use crate::message::{AdminRequest, AdminResponse, StorageRequest, StorageResponse};

/// One pooled request/response connection to a remote `host:port`.
struct Channel {
    addr: String,
    timeout: Option<Duration>,
    conn: Mutex<Option<TcpStream>>,
}

impl Channel {
    fn new(addr: String, timeout: Option<Duration>) -> Self {
        Self {
            addr,
            timeout,
            conn: Mutex::new(None),
        }
    }

    async fn call<Req, Resp>(&self, request: &Req) -> Result<Resp, NetError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let mut slot = self.conn.lock().await;
        let result = match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, Self::exchange(&self.addr, &mut slot, request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(NetError::Timeout),
                }
            }
            None => Self::exchange(&self.addr, &mut slot, request).await,
        };
        if result.is_err() {
            // The stream may hold a half-written or half-read frame.
            *slot = None;
        }
        result
    }

    async fn exchange<Req, Resp>(
        addr: &str,
        slot: &mut Option<TcpStream>,
        request: &Req,
    ) -> Result<Resp, NetError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let stream = match slot.take() {
            Some(stream) => slot.insert(stream),
            None => {
                debug!(addr, "dialling node");
                let stream =
                    TcpStream::connect(addr)
                        .await
                        .map_err(|source| NetError::Connect {
                            addr: addr.to_string(),
                            source,
                        })?;
                slot.insert(stream)
            }
        };
        write_frame(stream, request).await?;
        read_frame(stream).await
    }
}

/// Client for one storage node.
pub struct StorageClient {
    channel: Channel,
}

impl StorageClient {
    /// Create a client for the given `host:port`. The connection is
    /// dialled on first use.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            channel: Channel::new(addr.into(), None),
        }
    }

    /// Apply a per-call deadline. Expiry aborts the in-flight I/O and
    /// surfaces [`NetError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.channel.timeout = Some(timeout);
        self
    }

    /// The remote's `host:port`.
    pub fn addr(&self) -> &str {
        &self.channel.addr
    }

    /// Store a segment on the node.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<(), NetError> {
        let request = StorageRequest::Put {
            key: key.to_string(),
            data: data.to_vec(),
        };
        match self.channel.call(&request).await? {
            StorageResponse::Stored => Ok(()),
            StorageResponse::Error(e) => Err(NetError::Remote(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }

    /// Fetch a segment. Returns `None` when the node does not hold it.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, NetError> {
        let request = StorageRequest::Get {
            key: key.to_string(),
        };
        match self.channel.call(&request).await? {
            StorageResponse::Segment { data } => Ok(data.map(Bytes::from)),
            StorageResponse::Error(e) => Err(NetError::Remote(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }

    /// Delete a segment. Deleting an absent segment succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), NetError> {
        let request = StorageRequest::Delete {
            key: key.to_string(),
        };
        match self.channel.call(&request).await? {
            StorageResponse::Deleted => Ok(()),
            StorageResponse::Error(e) => Err(NetError::Remote(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }

    /// List every segment key the node holds.
    pub async fn list(&self) -> Result<Vec<String>, NetError> {
        match self.channel.call(&StorageRequest::List).await? {
            StorageResponse::Keys { keys } => Ok(keys),
            StorageResponse::Error(e) => Err(NetError::Remote(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }
}

/// Client for the admin control plane.
pub struct AdminClient {
    channel: Channel,
}

impl AdminClient {
    /// Create a client for the admin endpoint at `host:port`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            channel: Channel::new(addr.into(), None),
        }
    }

    /// Apply a per-call deadline.
    ///
    /// Note that AddNode/RemoveNode block until the whole migration
    /// completes; a deadline here bounds the operator's wait, not the
    /// migration itself.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.channel.timeout = Some(timeout);
        self
    }

    /// List current cluster members in ring order.
    pub async fn list_nodes(&self) -> Result<Vec<String>, NetError> {
        match self.channel.call(&AdminRequest::ListNodes).await? {
            AdminResponse::Nodes { addresses } => Ok(addresses),
            AdminResponse::Error(e) => Err(NetError::Admin(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }

    /// Add a node; returns the number of segments migrated onto it.
    pub async fn add_node(&self, address: &str) -> Result<u64, NetError> {
        let request = AdminRequest::AddNode {
            address: address.to_string(),
        };
        match self.channel.call(&request).await? {
            AdminResponse::Migrated { file_count } => Ok(file_count),
            AdminResponse::Error(e) => Err(NetError::Admin(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }

    /// Remove a node; returns the number of segments drained off it.
    pub async fn remove_node(&self, address: &str) -> Result<u64, NetError> {
        let request = AdminRequest::RemoveNode {
            address: address.to_string(),
        };
        match self.channel.call(&request).await? {
            AdminResponse::Migrated { file_count } => Ok(file_count),
            AdminResponse::Error(e) => Err(NetError::Admin(e)),
            _ => Err(NetError::UnexpectedResponse),
        }
    }
}
