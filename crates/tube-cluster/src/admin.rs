//! Control-plane RPC server for the operator CLI.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use tube_net::{
    AdminErrorKind, AdminRequest, AdminResponse, AdminWireError, NetError, read_frame, write_frame,
};

use crate::coordinator::{AdminCoordinator, AdminError};

/// Serves ListNodes / AddNode / RemoveNode over the framed wire protocol.
///
/// Migrations block the requesting connection until complete; there is no
/// streaming progress.
pub struct AdminServer {
    coordinator: Arc<AdminCoordinator>,
}

impl AdminServer {
    /// Create a server for the given coordinator.
    pub fn new(coordinator: Arc<AdminCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Accept operator connections until the listener fails.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                debug!(%peer, "admin connection accepted");
                match handle_connection(stream, coordinator).await {
                    Ok(()) => debug!(%peer, "admin connection closed"),
                    Err(e) => warn!(%peer, %e, "admin connection failed"),
                }
            });
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    coordinator: Arc<AdminCoordinator>,
) -> Result<(), NetError> {
    loop {
        let request: AdminRequest = match read_frame(&mut stream).await {
            Ok(request) => request,
            Err(NetError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };
        let response = handle_request(request, &coordinator).await;
        write_frame(&mut stream, &response).await?;
    }
}

async fn handle_request(request: AdminRequest, coordinator: &AdminCoordinator) -> AdminResponse {
    match request {
        AdminRequest::ListNodes => AdminResponse::Nodes {
            addresses: coordinator.list_nodes().await,
        },
        AdminRequest::AddNode { address } => match coordinator.add_node(&address).await {
            Ok(file_count) => AdminResponse::Migrated { file_count },
            Err(e) => {
                warn!(addr = %address, %e, "add-node failed");
                AdminResponse::Error(wire_error(e))
            }
        },
        AdminRequest::RemoveNode { address } => match coordinator.remove_node(&address).await {
            Ok(file_count) => AdminResponse::Migrated { file_count },
            Err(e) => {
                warn!(addr = %address, %e, "remove-node failed");
                AdminResponse::Error(wire_error(e))
            }
        },
    }
}

fn wire_error(e: AdminError) -> AdminWireError {
    let message = e.to_string();
    let kind = match e {
        AdminError::EmptyCluster => AdminErrorKind::EmptyCluster,
        AdminError::DuplicateNode { .. } => AdminErrorKind::DuplicateNode,
        AdminError::UnknownNode { .. } => AdminErrorKind::UnknownNode,
        AdminError::Aborted { migrated, .. } => AdminErrorKind::MigrationAborted { migrated },
        AdminError::Router(_) => AdminErrorKind::Internal,
    };
    AdminWireError { kind, message }
}
