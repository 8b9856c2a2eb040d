//! Transport seam
//!
//! `Connector` opens sockets and `Transport` moves text frames. The production
//! implementation runs over `tokio-tungstenite`.

use std::fmt;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use super::SessionKey;
use crate::error::ConnectError;

/// What the socket produced next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMessage {
    Text(String),
    /// Closed or closing, with the peer's close code if it sent one
    Closed(Option<u16>),
    Error(String),
}

/// Failure sending on or closing a transport
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Socket is closed")]
    Closed,

    #[error("Socket error: {0}")]
    Io(String),
}

impl From<WsError> for TransportError {
    fn from(err: WsError) -> Self {
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::Closed,
            other => Self::Io(other.to_string()),
        }
    }
}

/// One open duplex text socket
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next message. Must be cancel-safe.
    async fn receive(&mut self) -> TransportMessage;

    async fn close(&mut self, code: u16) -> Result<(), TransportError>;

    /// Last close code seen or sent on this socket
    fn close_code(&self) -> Option<u16>;
}

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, args: &ConnectArgs) -> Result<Box<dyn Transport>, ConnectError>;
}

/// Where and how to connect one session
#[derive(Clone)]
pub struct ConnectArgs {
    pub url: String,
    /// `Cookie` header from the login flow
    pub cookie: Option<String>,
    /// Team to bind the socket to; `None` for the main gateway
    pub team_id: Option<String>,
}

impl ConnectArgs {
    pub fn new(url: impl Into<String>, cookie: Option<String>) -> Self {
        Self {
            url: url.into(),
            cookie,
            team_id: None,
        }
    }

    /// The same endpoint bound to a team
    pub fn for_team(&self, team_id: impl Into<String>) -> Self {
        Self {
            team_id: Some(team_id.into()),
            ..self.clone()
        }
    }

    pub fn session_key(&self) -> SessionKey {
        self.team_id
            .as_ref()
            .map_or(SessionKey::Main, |team_id| SessionKey::Team(team_id.clone()))
    }

    /// URL with the `teamId` query parameter for team sessions
    pub fn endpoint(&self) -> String {
        match &self.team_id {
            Some(team_id) => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{separator}teamId={team_id}", self.url)
            }
            None => self.url.clone(),
        }
    }
}

impl fmt::Debug for ConnectArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectArgs")
            .field("url", &self.url)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("team_id", &self.team_id)
            .finish()
    }
}

/// Connects with `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, args: &ConnectArgs) -> Result<Box<dyn Transport>, ConnectError> {
        let mut request = args
            .endpoint()
            .into_client_request()
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        if let Some(cookie) = &args.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ConnectError::Transport(format!("invalid cookie header: {e}")))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|err| match err {
                WsError::Http(response) => ConnectError::Handshake {
                    status: response.status().as_u16(),
                },
                other => ConnectError::Transport(other.to_string()),
            })?;

        tracing::debug!(
            session = %args.session_key(),
            status = response.status().as_u16(),
            "WebSocket upgraded"
        );
        Ok(Box::new(TungsteniteTransport::new(stream)))
    }
}

/// `Transport` over a tungstenite WebSocket stream
pub struct TungsteniteTransport<S> {
    stream: WebSocketStream<S>,
    close_code: Option<u16>,
}

impl<S> TungsteniteTransport<S> {
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self {
            stream,
            close_code: None,
        }
    }
}

#[async_trait]
impl<S> Transport for TungsteniteTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    async fn receive(&mut self) -> TransportMessage {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return TransportMessage::Text(text),
                Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return TransportMessage::Text(text),
                    Err(_) => tracing::debug!("Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let code = frame.map(|frame| u16::from(frame.code));
                    self.close_code = code.or(self.close_code);
                    return TransportMessage::Closed(code);
                }
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return TransportMessage::Closed(self.close_code);
                }
                Some(Err(e)) => return TransportMessage::Error(e.to_string()),
            }
        }
    }

    async fn close(&mut self, code: u16) -> Result<(), TransportError> {
        self.close_code = Some(code);
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        };
        match self.stream.close(Some(frame)).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
}
