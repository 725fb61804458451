// src/server/mod.rs

//! Static dev server with live reload.

pub mod livereload;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::routing::get;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::context::ReloadHub;
use crate::errors::{AssetdagError, Result};

/// Routes: the live-reload socket and client, everything else from `root`.
pub fn router(root: impl Into<PathBuf>, reload: ReloadHub) -> Router {
    Router::new()
        .route(livereload::SOCKET_PATH, get(livereload::socket))
        .route(livereload::CLIENT_PATH, get(livereload::client_js))
        .fallback_service(ServeDir::new(root.into()))
        .layer(middleware::from_fn(livereload::inject_middleware))
        .with_state(reload)
}

/// A running dev server. Call [`DevServer::shutdown`] to stop it.
#[derive(Debug)]
pub struct DevServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl DevServer {
    /// Bind `host:port` and serve `root` in the background. Port `0` picks a
    /// free port; see [`DevServer::local_addr`].
    pub async fn start(
        host: &str,
        port: u16,
        root: impl Into<PathBuf>,
        reload: ReloadHub,
    ) -> Result<Self> {
        let root = root.into();
        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            AssetdagError::Other(anyhow::Error::new(e).context(format!("binding {host}:{port}")))
        })?;
        let local_addr = listener.local_addr()?;
        let app = router(&root, reload);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(err) = served {
                warn!("dev server stopped with error: {err}");
            }
        });

        info!(addr = %local_addr, root = ?root, "dev server listening");
        Ok(Self {
            local_addr,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.task.await {
            warn!("dev server task failed: {err}");
        }
    }
}
