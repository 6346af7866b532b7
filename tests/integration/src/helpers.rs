//! Test helpers for integration tests
//!
//! Provides a test server bound to an ephemeral port plus thin HTTP and
//! WebSocket clients for driving it.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use relay_common::AppConfig;
use relay_core::Envelope;
use relay_gateway::server::{create_app, create_gateway_state};
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// How long a client waits for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config);
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Publish a navigation and return the echoed envelope
    pub async fn navigate(&self, route: &str) -> Result<Envelope> {
        let response = self.get(&format!("/navigate/{route}")).await?;
        if response.status() != StatusCode::OK {
            bail!("navigate returned {}", response.status());
        }
        Ok(response.json().await?)
    }

    /// Current number of registered connections
    pub async fn connection_count(&self) -> Result<u64> {
        let body: serde_json::Value = self.get("/health").await?.json().await?;
        body["connections"]
            .as_u64()
            .ok_or_else(|| anyhow!("health response missing connections: {body}"))
    }

    /// Poll until the hub holds exactly `expected` connections
    pub async fn wait_for_connections(&self, expected: u64) -> Result<()> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let count = self.connection_count().await?;
            if count == expected {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("expected {expected} connections, hub has {count}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Open a WebSocket connection to the relay
    pub async fn connect(&self) -> Result<WsClient> {
        let (stream, _) = tokio_tungstenite::connect_async(self.ws_url()).await?;
        Ok(WsClient { stream })
    }

    /// Open `n` connections and wait until all are registered
    pub async fn connect_many(&self, n: usize) -> Result<Vec<WsClient>> {
        let before = self.connection_count().await?;
        let mut clients = Vec::with_capacity(n);
        for _ in 0..n {
            clients.push(self.connect().await?);
        }
        self.wait_for_connections(before + n as u64).await?;
        Ok(clients)
    }
}

/// WebSocket client for a single relay connection
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send a raw text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a raw binary frame
    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.stream.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Write bytes straight onto the TCP stream, bypassing framing
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let socket = self.stream.get_mut();
        socket.write_all(bytes).await?;
        socket.flush().await?;
        Ok(())
    }

    /// Send an encoded envelope
    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        let json = envelope.encode()?;
        self.send_text(&json).await
    }

    /// Wait for the next envelope
    pub async fn next_envelope(&mut self) -> Result<Envelope> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for envelope"))?
                .ok_or_else(|| anyhow!("connection ended"))??;

            match frame {
                Message::Text(text) => return Ok(Envelope::decode(&text)?),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => bail!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Assert nothing arrives for `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => bail!("expected silence, got {frame:?}"),
        }
    }

    /// Wait for the server's close frame and return its code
    pub async fn next_close_code(&mut self) -> Result<Option<u16>> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for close"))?;

            match frame {
                Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
                Some(Ok(Message::Text(text))) => bail!("expected close, got text {text}"),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Configuration used by tests: loopback host, defaults elsewhere
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}
