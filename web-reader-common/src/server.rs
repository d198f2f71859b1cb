//! HTTP server builder utilities.
//!
//! Binds a listener, serves an axum `Router`, and shuts down gracefully on
//! SIGTERM/SIGINT or when a programmatic shutdown signal fires.
//!
//! # Example
//!
//! ```ignore
//! use web_reader_common::server::HttpServerBuilder;
//!
//! HttpServerBuilder::new(router)
//!     .with_bind_addr("0.0.0.0:8080")
//!     .run()
//!     .await?;
//! ```

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Errors that can occur when running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("Failed to bind to {addr}: {message}")]
    BindFailed { addr: String, message: String },

    /// Error while serving connections
    #[error("Serve error: {0}")]
    Serve(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring and running the HTTP server.
pub struct HttpServerBuilder {
    router: Router,
    bind_addr: String,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl HttpServerBuilder {
    /// Create a new server builder for the given router.
    pub fn new(router: Router) -> Self {
        Self {
            router,
            bind_addr: "0.0.0.0:8080".to_string(),
            shutdown_rx: None,
        }
    }

    /// Set the `host:port` address to bind.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Set a shutdown signal receiver for graceful shutdown.
    ///
    /// When the sender is dropped or a message is sent, the server
    /// will initiate graceful shutdown.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener =
            TcpListener::bind(&self.bind_addr)
                .await
                .map_err(|e| ServerError::BindFailed {
                    addr: self.bind_addr.clone(),
                    message: e.to_string(),
                })?;

        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// Tests bind `127.0.0.1:0` themselves to learn the port before serving.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "HTTP server listening");

        let shutdown_rx = self.shutdown_rx;
        let shutdown_future = async move {
            if let Some(rx) = shutdown_rx {
                let _ = rx.await;
            } else {
                wait_for_shutdown_signal().await;
            }
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_future)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "Failed to register signal handlers");
                    std::future::pending::<()>().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to register Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C");
    }
}

/// Convenience function to set up graceful shutdown handling.
///
/// Returns a sender that can be used to trigger shutdown programmatically,
/// and a receiver to pass to the server builder.
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
