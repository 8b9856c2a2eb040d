//! Fake gateway server
//!
//! Accepts WebSocket upgrades on 127.0.0.1, answers each with a handshake
//! frame and hands the socket to the test, which scripts the rest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use guilded_cache::CacheOptions;
use parking_lot::Mutex as SyncMutex;
use guilded_gateway::{Client, GatewayOptions};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Cookie the test client authenticates with
pub const TEST_COOKIE: &str = "hmac_signed_session=integration";

/// Default wait for anything the server or client should do promptly
pub const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// One accepted gateway connection
pub struct ServerSocket {
    ws: WebSocketStream<TcpStream>,
    /// Request path and query of the upgrade
    pub path: String,
    pub cookie: Option<String>,
}

impl ServerSocket {
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send an application event as `42[kind, payload]`
    pub async fn send_event(&mut self, kind: &str, payload: Value) -> Result<()> {
        let frame = serde_json::json!([kind, payload]);
        self.send_text(&format!("42{frame}")).await
    }

    /// Next text frame from the client
    pub async fn recv_text(&mut self) -> Result<String> {
        tokio::time::timeout(STEP_TIMEOUT, self.next_text())
            .await
            .context("timed out waiting for a client frame")?
    }

    /// Close code the client sends, skipping any text frames before it
    pub async fn recv_close(&mut self) -> Result<Option<u16>> {
        tokio::time::timeout(STEP_TIMEOUT, self.next_close())
            .await
            .context("timed out waiting for the client to close")?
    }

    async fn next_text(&mut self) -> Result<String> {
        while let Some(message) = self.ws.next().await {
            match message? {
                Message::Text(text) => return Ok(text),
                Message::Close(_) => return Err(anyhow!("client closed the socket")),
                _ => {}
            }
        }
        Err(anyhow!("socket ended"))
    }

    async fn next_close(&mut self) -> Result<Option<u16>> {
        while let Some(message) = self.ws.next().await {
            if let Message::Close(frame) = message? {
                return Ok(frame.map(|frame| u16::from(frame.code)));
            }
        }
        Ok(None)
    }

    pub async fn close(&mut self, code: u16) -> Result<()> {
        self.ws
            .close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "".into(),
            }))
            .await?;
        Ok(())
    }
}

/// In-process gateway server
pub struct FakeGateway {
    pub addr: SocketAddr,
    accepted: Mutex<mpsc::UnboundedReceiver<ServerSocket>>,
    _handle: JoinHandle<()>,
}

impl FakeGateway {
    /// Accept every upgrade and send a handshake with a 25 second ping interval
    pub async fn start() -> Result<Self> {
        Self::spawn(None).await
    }

    /// Reject every upgrade with `status`
    pub async fn rejecting(status: StatusCode) -> Result<Self> {
        Self::spawn(Some(status)).await
    }

    async fn spawn(reject: Option<StatusCode>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut sequence = 0_u32;
            while let Ok((stream, _)) = listener.accept().await {
                sequence += 1;
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Ok(socket) = accept(stream, reject, sequence).await {
                        let _ = tx.send(socket);
                    }
                });
            }
        });

        Ok(Self {
            addr,
            accepted: Mutex::new(rx),
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}/socket.io/?jwt=undefined&EIO=3&transport=websocket", self.addr)
    }

    /// Next accepted connection, handshake already sent
    pub async fn accept(&self) -> Result<ServerSocket> {
        let mut accepted = self.accepted.lock().await;
        tokio::time::timeout(STEP_TIMEOUT, accepted.recv())
            .await
            .context("timed out waiting for a connection")?
            .ok_or_else(|| anyhow!("server stopped"))
    }

    /// Options pointing at this server with short reconnect delays
    pub fn options(&self) -> GatewayOptions {
        GatewayOptions::new(self.url())
            .with_cookie(TEST_COOKIE)
            .with_reconnect_base(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_secs(5))
    }

    pub fn client(&self, options: GatewayOptions) -> Client {
        Client::builder(options)
            .cache_options(CacheOptions { max_messages: 100 })
            .build()
    }
}

async fn accept(
    stream: TcpStream,
    reject: Option<StatusCode>,
    sequence: u32,
) -> Result<ServerSocket> {
    let captured: Arc<SyncMutex<(String, Option<String>)>> = Arc::default();
    let sink = captured.clone();

    let callback = move |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
        let cookie = request
            .headers()
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let path = request
            .uri()
            .path_and_query()
            .map(ToString::to_string)
            .unwrap_or_default();
        *sink.lock() = (path, cookie);

        match reject {
            Some(status) => {
                let mut rejection = ErrorResponse::new(None);
                *rejection.status_mut() = status;
                Err(rejection)
            }
            None => Ok(response),
        }
    };

    let ws = tokio_tungstenite::accept_hdr_async(stream, callback).await?;
    let (path, cookie) = captured.lock().clone();

    let mut socket = ServerSocket { ws, path, cookie };
    socket
        .send_text(&format!(
            r#"0{{"sid":"sid-{sequence}","upgrades":[],"pingInterval":25000,"pingTimeout":5000}}"#
        ))
        .await?;
    Ok(socket)
}
