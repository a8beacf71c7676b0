//! WebSocket transport: endpoint parsing, optional custom-CA TLS, and the
//! receive side of the agent stream.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, tungstenite::Message, Connector,
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

use crate::connection::{Dialer, Transport};
use crate::error::ConnectionError;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080/ws";
pub const DEFAULT_PATH: &str = "/ws";
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts `ws://`/`wss://` URLs, or a bare `host:port` which becomes
/// `ws://host:port/ws`.
pub fn parse_endpoint(input: &str) -> Result<Url, ConnectionError> {
    let input = input.trim();
    let invalid = |reason: String| ConnectionError::InvalidEndpoint {
        endpoint: input.to_string(),
        reason,
    };
    if input.is_empty() {
        return Err(invalid("empty endpoint".into()));
    }
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("ws://{input}{DEFAULT_PATH}")
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(url)
}

/// Build a rustls client config trusting only the certificates in `path`.
pub fn load_tls_ca(path: &Path) -> Result<Arc<rustls::ClientConfig>, ConnectionError> {
    let file = File::open(path)
        .map_err(|e| ConnectionError::Tls(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| ConnectionError::Tls(format!("{}: {e}", path.display())))?;
        roots
            .add(cert)
            .map_err(|e| ConnectionError::Tls(e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(ConnectionError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    let cfg = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(cfg))
}

/// Dials the agent over WebSocket.
#[derive(Clone)]
pub struct WsDialer {
    tls: Option<Arc<rustls::ClientConfig>>,
    timeout: Duration,
}

impl WsDialer {
    pub fn new(tls_ca: Option<&Path>) -> Result<Self, ConnectionError> {
        let tls = tls_ca.map(load_tls_ca).transpose()?;
        Ok(Self {
            tls,
            timeout: CONNECT_TIMEOUT,
        })
    }
}

impl Dialer for WsDialer {
    type Conn = WsTransport;

    async fn dial(&mut self, endpoint: &Url) -> Result<WsTransport, ConnectionError> {
        let target = endpoint.as_str();
        let connect = async {
            match (&self.tls, endpoint.scheme()) {
                (Some(cfg), "wss") => {
                    connect_async_tls_with_config(
                        target,
                        None,
                        false,
                        Some(Connector::Rustls(cfg.clone())),
                    )
                    .await
                }
                _ => connect_async(target).await,
            }
        };
        let result = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| ConnectionError::Timeout {
                endpoint: target.to_string(),
            })?;
        let (ws, resp) = result.map_err(|e| ConnectionError::Unreachable {
            endpoint: target.to_string(),
            reason: e.to_string(),
        })?;
        debug!(status = %resp.status(), "websocket handshake complete");
        Ok(WsTransport { ws })
    }
}

pub struct WsTransport {
    ws: WsStream,
}

impl Transport for WsTransport {
    async fn recv(&mut self) -> Option<Result<Vec<u8>, ConnectionError>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.into_bytes())),
                Ok(Message::Binary(bytes)) => return Some(Ok(bytes)),
                Ok(Message::Close(_)) => return None,
                // ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(ConnectionError::Lost(e.to_string()))),
            }
        }
    }

    async fn close_gracefully(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
