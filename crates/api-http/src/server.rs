//! Status Server
//!
//! Binds at startup (a taken port is a startup failure), then serves until
//! the shared shutdown token fires.

use crate::error::ApiError;
use crate::handler::build_router;
use homewatch_core::application::ShutdownToken;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_HTTP_PORT: u16 = 8080;

/// Status Server Configuration
#[derive(Debug, Clone)]
pub struct StatusServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for StatusServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl StatusServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Bound, not yet serving
pub struct StatusServer {
    listener: TcpListener,
}

impl StatusServer {
    /// Bind the listening socket
    ///
    /// # Errors
    /// Returns `ApiError::Bind` if the address is unavailable
    pub async fn bind(config: &StatusServerConfig) -> Result<Self, ApiError> {
        let addr = config.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiError::Bind { addr, source })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ApiError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` fires, then drain in-flight requests
    pub async fn serve(self, mut shutdown: ShutdownToken) -> Result<(), ApiError> {
        let addr = self.local_addr()?;
        info!(addr = %addr, "Status server listening");

        axum::serve(self.listener, build_router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        info!("Status server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homewatch_core::application::shutdown_channel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn loopback() -> StatusServerConfig {
        StatusServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }

    #[tokio::test]
    async fn test_serves_status_until_shutdown() {
        let server = StatusServer::bind(&loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let handle = tokio::spawn(server.serve(shutdown_rx));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.ends_with("{\"status\":\"ok\"}"));

        shutdown_tx.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let server = StatusServer::bind(&loopback()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let handle = tokio::spawn(server.serve(shutdown_rx));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /jobs HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 404 Not Found"));

        shutdown_tx.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_error() {
        let first = StatusServer::bind(&loopback()).await.unwrap();
        let taken = StatusServerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: first.local_addr().unwrap().port(),
        };

        let result = StatusServer::bind(&taken).await;

        assert!(matches!(result, Err(ApiError::Bind { .. })));
    }
}
