//! Storage node request loop.

use std::sync::Arc;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use tube_net::{
    NetError, StorageErrorKind, StorageRequest, StorageResponse, StorageWireError, read_frame,
    write_frame,
};
use tube_store::{SegmentStore, StoreError};
use tube_types::ObjectKey;

/// Serves a [`SegmentStore`] over the framed wire protocol.
pub struct StorageServer {
    store: Arc<dyn SegmentStore>,
}

impl StorageServer {
    /// Create a server for the given store.
    pub fn new(store: Arc<dyn SegmentStore>) -> Self {
        Self { store }
    }

    /// Accept connections on the listener until it fails.
    ///
    /// Each connection gets its own task; requests on one connection are
    /// processed in order, which gives per-key last-writer-wins semantics
    /// to a single caller.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let store = self.store.clone();
            tokio::spawn(async move {
                debug!(%peer, "storage connection accepted");
                match handle_connection(stream, store).await {
                    Ok(()) => debug!(%peer, "storage connection closed"),
                    Err(e) => warn!(%peer, %e, "storage connection failed"),
                }
            });
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    store: Arc<dyn SegmentStore>,
) -> Result<(), NetError> {
    loop {
        let request: StorageRequest = match read_frame(&mut stream).await {
            Ok(request) => request,
            Err(NetError::Io(e)) if is_disconnect(&e) => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = handle_request(request, store.as_ref()).await;
        write_frame(&mut stream, &response).await?;
    }
}

fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
    )
}

async fn handle_request(request: StorageRequest, store: &dyn SegmentStore) -> StorageResponse {
    match request {
        StorageRequest::Put { key, data } => match ObjectKey::parse(&key) {
            Ok(parsed) => match store.put(&parsed, Bytes::from(data)).await {
                Ok(()) => {
                    debug!(%parsed, "stored segment");
                    StorageResponse::Stored
                }
                Err(e) => store_error(&key, e),
            },
            Err(e) => malformed(&key, e),
        },

        StorageRequest::Get { key } => match ObjectKey::parse(&key) {
            Ok(parsed) => match store.get(&parsed).await {
                Ok(data) => StorageResponse::Segment {
                    data: data.map(|b| b.to_vec()),
                },
                Err(e) => store_error(&key, e),
            },
            Err(e) => malformed(&key, e),
        },

        StorageRequest::Delete { key } => match ObjectKey::parse(&key) {
            Ok(parsed) => match store.delete(&parsed).await {
                Ok(()) => StorageResponse::Deleted,
                Err(e) => store_error(&key, e),
            },
            Err(e) => malformed(&key, e),
        },

        StorageRequest::List => match store.list().await {
            Ok(keys) => StorageResponse::Keys {
                keys: keys.iter().map(ObjectKey::to_string).collect(),
            },
            Err(e) => store_error("<list>", e),
        },
    }
}

fn malformed(key: &str, e: tube_types::KeyError) -> StorageResponse {
    warn!(key, %e, "rejecting malformed key");
    StorageResponse::Error(StorageWireError {
        kind: StorageErrorKind::MalformedKey,
        message: e.to_string(),
    })
}

fn store_error(key: &str, e: StoreError) -> StorageResponse {
    // An unsafe filename is a key problem, not a node fault.
    let kind = match &e {
        StoreError::UnsafePath(_) => StorageErrorKind::MalformedKey,
        StoreError::Io(_) => StorageErrorKind::Internal,
    };
    warn!(key, %e, "storage operation failed");
    StorageResponse::Error(StorageWireError {
        kind,
        message: e.to_string(),
    })
}
