//! `tubed` — the TritonTube daemon.
//!
//! One binary, three roles:
//!
//! ```text
//! tubed web                                  # front-end + admin control plane
//! tubed web --content cluster \
//!           --content-options "127.0.0.1:8081,127.0.0.1:8090,127.0.0.1:8091"
//! tubed storage -l 127.0.0.1:8090 -d ./segments   # one storage node
//! tubed admin -a 127.0.0.1:8081 list-nodes        # operator CLI
//! tubed admin -a 127.0.0.1:8081 add-node 127.0.0.1:8092
//! tubed admin -a 127.0.0.1:8081 remove-node 127.0.0.1:8092
//! ```

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tube_cluster::{AdminCoordinator, AdminServer, ClusterOptions, ContentRouter};
use tube_meta::MetaStore;
use tube_net::{AdminClient, NetError};
use tube_store::FileStore;
use tube_storage::StorageServer;
use tube_web::{ContentService, LocalContent, RouterContent, WebServer};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "tubed", version, about = "TritonTube video hosting daemon")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the upload/browse front-end (and, in cluster mode, the admin
    /// control plane).
    Web {
        /// Override the HTTP listen address.
        #[arg(short, long)]
        listen: Option<String>,

        /// Override the metadata directory.
        #[arg(short, long)]
        metadata_dir: Option<PathBuf>,

        /// Content backend: "fs" or "cluster".
        #[arg(long)]
        content: Option<String>,

        /// Backend options: base directory for "fs",
        /// "adminAddr,node1,node2,…" for "cluster".
        #[arg(long)]
        content_options: Option<String>,

        /// Keep metadata in memory (no disk persistence).
        #[arg(long)]
        memory: bool,
    },

    /// Run one storage node.
    Storage {
        /// Override the listen address.
        #[arg(short, long)]
        listen: Option<String>,

        /// Override the segment directory.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Operate on cluster membership via the admin control plane.
    Admin {
        /// Admin endpoint address (`host:port`).
        #[arg(short, long)]
        admin_addr: String,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List cluster members in ring order.
    ListNodes,
    /// Add a storage node and migrate the segments it now owns.
    AddNode {
        /// `host:port` of the joining node.
        address: String,
    },
    /// Drain and remove a storage node.
    RemoveNode {
        /// `host:port` of the departing node.
        address: String,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;
    telemetry::init(&config.log.level);

    match cli.command {
        Commands::Web {
            listen,
            metadata_dir,
            content,
            content_options,
            memory,
        } => {
            if let Some(listen) = listen {
                config.web.listen_addr = listen;
            }
            if let Some(dir) = metadata_dir {
                config.web.metadata_dir = dir;
            }
            if let Some(content) = content {
                config.web.content = content;
            }
            if let Some(options) = content_options {
                config.web.content_options = options;
            }
            cmd_web(config, memory).await
        }
        Commands::Storage { listen, data_dir } => {
            if let Some(listen) = listen {
                config.storage.listen_addr = listen;
            }
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            cmd_storage(config).await
        }
        Commands::Admin { admin_addr, action } => cmd_admin(&admin_addr, action).await,
    }
}

// -----------------------------------------------------------------------
// tubed web
// -----------------------------------------------------------------------

async fn cmd_web(config: CliConfig, memory: bool) -> Result<()> {
    let meta = if memory {
        info!("using in-memory metadata store");
        Arc::new(MetaStore::in_memory())
    } else {
        info!(dir = %config.web.metadata_dir.display(), "opening metadata store");
        Arc::new(
            MetaStore::open(&config.web.metadata_dir).context("failed to open metadata store")?,
        )
    };

    let rpc_timeout = match config.web.rpc_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let content: Arc<dyn ContentService> = match config.web.content.as_str() {
        "fs" => {
            info!(dir = %config.web.content_options, "serving content from local filesystem");
            let store = FileStore::new(&config.web.content_options)
                .context("failed to open content directory")?;
            Arc::new(LocalContent::new(store))
        }
        "cluster" => {
            let options = ClusterOptions::parse(&config.web.content_options)
                .context("invalid cluster content options")?;
            info!(
                admin = %options.admin_addr,
                nodes = options.nodes.len(),
                "serving content from storage cluster"
            );
            let router = Arc::new(
                ContentRouter::with_rpc_timeout(&options.nodes, rpc_timeout)
                    .context("failed to build content router")?,
            );
            let coordinator = Arc::new(AdminCoordinator::new(router.clone()));

            let admin_listener = TcpListener::bind(&options.admin_addr)
                .await
                .with_context(|| format!("failed to bind admin endpoint {}", options.admin_addr))?;
            info!(addr = %options.admin_addr, "admin control plane listening");
            let admin_server = AdminServer::new(coordinator);
            tokio::spawn(async move {
                if let Err(e) = admin_server.serve(admin_listener).await {
                    warn!(%e, "admin server stopped");
                }
            });

            Arc::new(RouterContent::new(router))
        }
        other => anyhow::bail!("unknown content backend {other:?}, expected \"fs\" or \"cluster\""),
    };

    WebServer::new(meta, content)
        .serve_with_shutdown(&config.web.listen_addr, shutdown_signal())
        .await
        .context("web server failed")?;

    info!("shutdown complete");
    Ok(())
}

// -----------------------------------------------------------------------
// tubed storage
// -----------------------------------------------------------------------

async fn cmd_storage(config: CliConfig) -> Result<()> {
    let store =
        Arc::new(FileStore::new(&config.storage.data_dir).context("failed to open data dir")?);
    let listener = TcpListener::bind(&config.storage.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.storage.listen_addr))?;
    info!(
        addr = %config.storage.listen_addr,
        dir = %config.storage.data_dir.display(),
        "storage node listening"
    );

    let server = StorageServer::new(store);
    tokio::select! {
        result = server.serve(listener) => result.context("storage server failed")?,
        () = shutdown_signal() => info!("shutdown complete"),
    }
    Ok(())
}

// -----------------------------------------------------------------------
// tubed admin
// -----------------------------------------------------------------------

async fn cmd_admin(admin_addr: &str, action: AdminAction) -> Result<()> {
    let client = AdminClient::new(admin_addr);
    let result = match action {
        AdminAction::ListNodes => {
            let nodes = client.list_nodes().await;
            match nodes {
                Ok(nodes) => {
                    for node in nodes {
                        println!("{node}");
                    }
                    return Ok(());
                }
                Err(e) => Err(e),
            }
        }
        AdminAction::AddNode { address } => client.add_node(&address).await,
        AdminAction::RemoveNode { address } => client.remove_node(&address).await,
    };

    match result {
        Ok(migrated) => {
            println!("{migrated}");
            Ok(())
        }
        Err(NetError::Admin(e)) => {
            eprintln!("{}: {}", e.kind, e.message);
            std::process::exit(1);
        }
        Err(e) => Err(e).context("admin call failed"),
    }
}

// -----------------------------------------------------------------------
// Signal handling
// -----------------------------------------------------------------------

/// Wait for SIGTERM or SIGINT (Ctrl-C).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
