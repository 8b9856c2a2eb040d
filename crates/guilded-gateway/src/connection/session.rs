//! Socket session
//!
//! Owns one transport. `build` connects and consumes the handshake frame,
//! which starts the heartbeat thread. `poll_event` then handles one inbound
//! frame per call, servicing heartbeat and close commands while it waits for
//! the frame and while the frame's event is routed.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use super::{ConnectArgs, Connector, Heartbeat, LatencyGauge, SessionKey, Transport, TransportError, TransportMessage};
use crate::broadcast::{Dispatcher, EventArg};
use crate::error::{ConnectError, PollError};
use crate::handlers::EventRouter;
use crate::protocol::{self, DecodedEvent, HelloFrame, InboundFrame, OutboundFrame};

/// Requests handled by the task polling the session
pub(crate) enum SessionCommand {
    /// Send a heartbeat and report the outcome to the heartbeat thread
    Heartbeat {
        reply: std::sync::mpsc::SyncSender<Result<(), String>>,
    },
    /// Close the socket with `code`
    Close { code: u16, reply: oneshot::Sender<()> },
}

/// Shared collaborators of every session
#[derive(Clone)]
pub struct SessionContext {
    pub router: Arc<EventRouter>,
    /// Heartbeat send wait slice
    pub heartbeat_block_warn: Duration,
}

impl SessionContext {
    pub fn new(router: Arc<EventRouter>, heartbeat_block_warn: Duration) -> Self {
        Self {
            router,
            heartbeat_block_warn,
        }
    }

    fn dispatcher(&self) -> &Dispatcher {
        self.router.dispatcher()
    }
}

/// One connected gateway socket
pub struct GatewaySession {
    key: SessionKey,
    transport: Box<dyn Transport>,
    sid: Option<String>,
    upgrades: Vec<String>,
    heartbeat_interval: Option<Duration>,
    close_code: Option<u16>,
    latency: Arc<LatencyGauge>,
    heartbeat: Option<Heartbeat>,
    commands_tx: mpsc::UnboundedSender<SessionCommand>,
    commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ctx: SessionContext,
}

enum Next {
    Command(SessionCommand),
    Message(TransportMessage),
}

impl GatewaySession {
    /// Connect and complete the handshake
    pub async fn build(
        connector: &dyn Connector,
        args: &ConnectArgs,
        ctx: SessionContext,
    ) -> Result<Self, ConnectError> {
        let key = args.session_key();
        tracing::debug!(session = %key, url = %args.url, "Connecting to gateway");

        let transport = connector.connect(args).await?;
        let mut session = Self::new(key, transport, ctx);

        session
            .send(&OutboundFrame::heartbeat())
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        session.latency.record_ping();

        match session.poll_event().await {
            Ok(()) => {}
            Err(e) if e.is_disconnect() => return Err(ConnectError::Transport(e.to_string())),
            Err(e) => return Err(ConnectError::HandshakeFrame(e.to_string())),
        }
        if session.sid.is_none() {
            return Err(ConnectError::HandshakeFrame(
                "first frame carried no session id".to_string(),
            ));
        }

        tracing::info!(session = %session.key, sid = ?session.sid, "Gateway session established");
        Ok(session)
    }

    fn new(key: SessionKey, transport: Box<dyn Transport>, ctx: SessionContext) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            key,
            transport,
            sid: None,
            upgrades: Vec::new(),
            heartbeat_interval: None,
            close_code: None,
            latency: Arc::new(LatencyGauge::new()),
            heartbeat: None,
            commands_tx,
            commands_rx,
            ctx,
        }
    }

    /// Wait for and handle one inbound frame.
    ///
    /// Returns [`PollError::Closed`] once the socket is closed or closing.
    pub async fn poll_event(&mut self) -> Result<(), PollError> {
        loop {
            let next = tokio::select! {
                biased;
                Some(command) = self.commands_rx.recv() => Next::Command(command),
                message = self.transport.receive() => Next::Message(message),
            };

            match next {
                Next::Command(command) => self.run_command(command).await?,
                Next::Message(message) => return self.handle_message(message).await,
            }
        }
    }

    /// Send a frame, publishing its text as `socket_raw_send`
    pub async fn send(&mut self, frame: &OutboundFrame) -> Result<(), TransportError> {
        let text = frame.encode();
        self.ctx
            .dispatcher()
            .dispatch("socket_raw_send", vec![EventArg::Text(text.clone())]);
        self.transport.send_text(text).await
    }

    /// Log out (best-effort) and close the socket with `code`
    pub async fn close(&mut self, code: u16) -> Result<(), TransportError> {
        self.close_code = Some(code);
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.stop();
        }

        if let Err(e) = self.send(&OutboundFrame::logout()).await {
            tracing::debug!(session = %self.key, error = %e, "Logout frame not sent");
        }
        tracing::debug!(session = %self.key, code, "Closing gateway session");
        self.transport.close(code).await
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Session id from the handshake
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn upgrades(&self) -> &[String] {
        &self.upgrades
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn close_code(&self) -> Option<u16> {
        self.close_code.or_else(|| self.transport.close_code())
    }

    /// Last heartbeat round-trip; `None` until one completes
    pub fn latency(&self) -> Option<Duration> {
        self.latency.latency()
    }

    pub fn is_heartbeat_running(&self) -> bool {
        self.heartbeat.as_ref().is_some_and(Heartbeat::is_running)
    }

    /// A handle other tasks can use to reach this session
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.key.clone(), self.commands_tx.clone(), self.latency.clone())
    }

    async fn run_command(&mut self, command: SessionCommand) -> Result<(), PollError> {
        match command {
            SessionCommand::Heartbeat { reply } => {
                let outcome = self.send(&OutboundFrame::heartbeat()).await;
                if outcome.is_ok() {
                    self.latency.record_ping();
                }
                // The heartbeat thread may have given up already
                let _ = reply.send(outcome.map_err(|e| e.to_string()));
                Ok(())
            }
            SessionCommand::Close { code, reply } => {
                if let Err(e) = self.close(code).await {
                    tracing::debug!(session = %self.key, error = %e, "Close failed");
                }
                let _ = reply.send(());
                Err(PollError::Closed { code: Some(code) })
            }
        }
    }

    async fn handle_message(&mut self, message: TransportMessage) -> Result<(), PollError> {
        match message {
            TransportMessage::Text(text) => self.received(&text).await,
            TransportMessage::Closed(code) => {
                if code.is_some() {
                    self.close_code = code;
                }
                Err(PollError::Closed { code })
            }
            TransportMessage::Error(e) => Err(PollError::Transport(e)),
        }
    }

    async fn received(&mut self, text: &str) -> Result<(), PollError> {
        let dispatcher = self.ctx.dispatcher();
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            dispatcher.dispatch("socket_raw_receive", vec![EventArg::Text(text.to_string())]);
        }

        match protocol::decode(text)? {
            None => {}
            Some(InboundFrame::Pong) => {
                if let Some(rtt) = self.latency.record_pong() {
                    tracing::trace!(session = %self.key, rtt_ms = rtt.as_millis() as u64, "Heartbeat acknowledged");
                }
            }
            Some(InboundFrame::Hello(hello)) => {
                dispatcher.dispatch("socket_response", vec![EventArg::Raw(Arc::new(hello_document(&hello)))]);
                self.on_hello(hello);
            }
            Some(InboundFrame::Event(event)) => {
                dispatcher.dispatch("socket_response", vec![EventArg::Raw(Arc::new(event_document(&event)))]);
                self.route(event).await?;
            }
        }
        Ok(())
    }

    /// Route `event`, still answering heartbeat and close commands while handlers run
    async fn route(&mut self, event: DecodedEvent) -> Result<(), PollError> {
        let router = self.ctx.router.clone();
        let routing = async move { router.route(&event).await };
        tokio::pin!(routing);

        loop {
            let command = tokio::select! {
                biased;
                result = &mut routing => return result.map_err(PollError::from),
                Some(command) = self.commands_rx.recv() => command,
            };
            self.run_command(command).await?;
        }
    }

    fn on_hello(&mut self, hello: HelloFrame) {
        tracing::debug!(
            session = %self.key,
            sid = %hello.sid,
            ping_interval_ms = hello.ping_interval.as_millis() as u64,
            "Handshake received"
        );
        self.sid = Some(hello.sid);
        self.upgrades = hello.upgrades;
        self.heartbeat_interval = Some(hello.ping_interval);

        if self.heartbeat.is_some() {
            return;
        }
        if hello.ping_interval.is_zero() {
            tracing::warn!(session = %self.key, "Handshake without a ping interval, heartbeat disabled");
            return;
        }

        match Heartbeat::start(
            self.key.label(),
            hello.ping_interval,
            self.ctx.heartbeat_block_warn,
            self.commands_tx.clone(),
        ) {
            Ok(heartbeat) => self.heartbeat = Some(heartbeat),
            Err(e) => tracing::error!(session = %self.key, error = %e, "Failed to start heartbeat thread"),
        }
    }
}

impl std::fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySession")
            .field("key", &self.key)
            .field("sid", &self.sid)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("close_code", &self.close_code)
            .field("latency", &self.latency.latency())
            .finish()
    }
}

fn hello_document(hello: &HelloFrame) -> Value {
    json!({
        "sid": hello.sid,
        "upgrades": hello.upgrades,
        "pingInterval": hello.ping_interval.as_millis() as u64,
    })
}

fn event_document(event: &DecodedEvent) -> Value {
    let mut document = event.payload.clone();
    if let Value::Object(fields) = &mut document {
        fields.insert("type".to_string(), Value::String(event.kind.clone()));
    }
    document
}

/// Cloneable handle to a session owned by another task
#[derive(Clone)]
pub struct SessionHandle {
    key: SessionKey,
    commands: mpsc::UnboundedSender<SessionCommand>,
    latency: Arc<LatencyGauge>,
}

impl SessionHandle {
    pub(crate) fn new(
        key: SessionKey,
        commands: mpsc::UnboundedSender<SessionCommand>,
        latency: Arc<LatencyGauge>,
    ) -> Self {
        Self {
            key,
            commands,
            latency,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency.latency()
    }

    /// Whether the session still exists
    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Ask the polling task to close the session.
    ///
    /// Returns `false` if the session was already gone.
    pub async fn close(&self, code: u16) -> bool {
        let (reply, done) = oneshot::channel();
        if self.commands.send(SessionCommand::Close { code, reply }).is_err() {
            return false;
        }
        done.await.is_ok()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .finish()
    }
}
