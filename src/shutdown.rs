use crate::database::DatabaseManager;
use std::{sync::Arc, time::Duration};
use tokio::{signal, sync::watch, time::timeout};
use tracing::{error, info, warn};

/// One-shot shutdown flag shared by the signal listener, the HTTP server and `Server::run`
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Flip the flag; later calls are no-ops
    pub fn trigger(&self) {
        let flipped = self.tx.send_if_modified(|triggered| !std::mem::replace(triggered, true));
        if flipped {
            info!("Initiating graceful shutdown");
        }
    }

    /// Resolves once the flag is set, by an OS signal or by hand
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so this cannot observe a closed channel
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Wait for SIGINT or SIGTERM, then trigger
    pub async fn listen_for_os_signals(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C"),
            _ = terminate => info!("Received SIGTERM"),
            _ = self.triggered() => {},
        }

        self.trigger();
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Close the connection pool once the HTTP server has drained, giving up after `limit`
pub async fn close_database(database: &dyn DatabaseManager, limit: Duration) {
    info!("Closing database connections");

    match timeout(limit, database.connection().clone().close()).await {
        Ok(Ok(())) => info!("Database connections closed"),
        Ok(Err(e)) => error!("Failed to close database connections: {}", e),
        Err(_) => warn!(
            timeout_secs = limit.as_secs(),
            "Timed out closing database connections"
        ),
    }
}
