//! In-memory transports for session, router and supervisor tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use guilded_cache::{CacheOptions, CacheStore, NullFetcher, Resolver};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{ConnectArgs, Connector, SessionContext, Transport, TransportError, TransportMessage};
use crate::broadcast::Dispatcher;
use crate::error::ConnectError;
use crate::handlers::EventRouter;

/// Handshake frame with a 25 second ping interval
pub fn hello(sid: &str) -> String {
    hello_with_interval(sid, 25_000)
}

pub fn hello_with_interval(sid: &str, ping_interval_ms: u64) -> String {
    format!(r#"0{{"sid":"{sid}","upgrades":[],"pingInterval":{ping_interval_ms}}}"#)
}

pub fn test_context() -> SessionContext {
    let cache = CacheStore::new_shared(CacheOptions::default());
    let router = EventRouter::new(Resolver::new(cache, Arc::new(NullFetcher)), Dispatcher::new());
    SessionContext::new(Arc::new(router), Duration::from_secs(10))
}

/// Server side of a [`MockTransport`]
#[derive(Clone)]
pub struct MockServer {
    inbound: mpsc::UnboundedSender<TransportMessage>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<Option<u16>>>,
}

impl MockServer {
    pub fn push_text(&self, text: &str) {
        let _ = self.inbound.send(TransportMessage::Text(text.to_string()));
    }

    pub fn close(&self, code: Option<u16>) {
        let _ = self.inbound.send(TransportMessage::Closed(code));
    }

    /// Frames the client sent, oldest first
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Code the client closed with
    pub fn closed_with(&self) -> Option<u16> {
        *self.closed.lock()
    }
}

pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<TransportMessage>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<Option<u16>>>,
    close_code: Option<u16>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.lock().is_some() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    async fn receive(&mut self) -> TransportMessage {
        match self.inbound.recv().await {
            Some(TransportMessage::Closed(code)) => {
                self.close_code = code.or(self.close_code);
                TransportMessage::Closed(code)
            }
            Some(message) => message,
            None => TransportMessage::Closed(self.close_code),
        }
    }

    async fn close(&mut self, code: u16) -> Result<(), TransportError> {
        self.close_code = Some(code);
        *self.closed.lock() = Some(code);
        Ok(())
    }

    fn close_code(&self) -> Option<u16> {
        self.close_code
    }
}

/// Hands out scripted transports in order
#[derive(Default)]
pub struct MockConnector {
    scripts: Mutex<VecDeque<Result<MockTransport, ConnectError>>>,
    attempts: AtomicUsize,
    requests: Mutex<Vec<ConnectArgs>>,
    team_delay: Mutex<Option<Duration>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful connection and return its server side
    pub fn script(&self) -> MockServer {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(None));

        self.scripts.lock().push_back(Ok(MockTransport {
            inbound: inbound_rx,
            sent: sent.clone(),
            closed: closed.clone(),
            close_code: None,
        }));
        MockServer {
            inbound: inbound_tx,
            sent,
            closed,
        }
    }

    /// Queue a connection with the handshake frame already pushed
    pub fn script_ready(&self, sid: &str) -> MockServer {
        let server = self.script();
        server.push_text(&hello(sid));
        server
    }

    /// Queue a failed connection attempt
    pub fn fail_next(&self, err: ConnectError) {
        self.scripts.lock().push_back(Err(err));
    }

    /// Stall every team connection attempt for `delay`
    pub fn delay_teams(&self, delay: Duration) {
        *self.team_delay.lock() = Some(delay);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Team ids of every connection attempt, `None` for the main gateway
    pub fn attempted_teams(&self) -> Vec<Option<String>> {
        self.requests.lock().iter().map(|args| args.team_id.clone()).collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, args: &ConnectArgs) -> Result<Box<dyn Transport>, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(args.clone());

        let next = self.scripts.lock().pop_front();
        let delay = *self.team_delay.lock();
        if let (Some(delay), Some(_)) = (delay, &args.team_id) {
            tokio::time::sleep(delay).await;
        }
        match next {
            Some(Ok(transport)) => Ok(Box::new(transport)),
            Some(Err(err)) => Err(err),
            None => Err(ConnectError::Transport("no scripted connection".to_string())),
        }
    }
}
