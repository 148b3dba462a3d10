mod routes;

use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::{oneshot, watch};

use crate::surface::OverlaySnapshot;

/// Local HTTP server the host map widget polls for overlays and markers.
pub struct OverlayServer {
    #[allow(dead_code)] // Kept alive to keep server running
    runtime: Runtime,
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl OverlayServer {
    pub fn start(snapshots: watch::Receiver<Arc<OverlaySnapshot>>) -> eyre::Result<Self> {
        let runtime = Runtime::new()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let listener =
            runtime.block_on(async { tokio::net::TcpListener::bind("127.0.0.1:0").await })?;
        let port = listener.local_addr()?.port();

        let app = routes::create_router(snapshots);

        runtime.spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;

            if let Err(error) = served {
                tracing::error!("overlay server stopped: {error}");
            }
        });

        tracing::info!("overlay server listening on port {port}");

        Ok(Self {
            runtime,
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

impl Drop for OverlayServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
