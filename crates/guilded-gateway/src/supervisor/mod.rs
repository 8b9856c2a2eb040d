//! Session supervisor
//!
//! Owns the main session and one session per team, runs a receive loop for
//! each and rebuilds dropped sessions with linear backoff. Loops are
//! independent: a team socket reconnecting never stalls the main one.

mod backoff;

pub use backoff::Backoff;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use guilded_common::GatewayConfig;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::broadcast::{Dispatcher, EventArg, EventArgs};
use crate::connection::{
    ConnectArgs, Connector, GatewaySession, SessionContext, SessionKey, SessionRegistry,
};
use crate::error::{ConnectError, GatewayError, PollError};
use crate::handlers::EventRouter;
use crate::protocol::close_codes;

/// How long `close` waits for each receive loop to wind down
const LOOP_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Runtime gateway settings
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub url: String,
    pub cookie: Option<String>,
    pub team_ids: Vec<String>,
    pub disable_team_websockets: bool,
    /// Bound on building (or rebuilding) one session
    pub connect_timeout: Duration,
    /// First reconnect delay; each further failed attempt adds this much again
    pub reconnect_base: Duration,
    pub heartbeat_block_warn: Duration,
}

impl GatewayOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookie: None,
            team_ids: Vec::new(),
            disable_team_websockets: false,
            connect_timeout: Duration::from_secs(60),
            reconnect_base: Duration::from_secs(5),
            heartbeat_block_warn: Duration::from_secs(10),
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_team_ids(mut self, team_ids: Vec<String>) -> Self {
        self.team_ids = team_ids;
        self
    }

    pub fn with_reconnect_base(mut self, base: Duration) -> Self {
        self.reconnect_base = base;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn connect_args(&self, key: &SessionKey) -> ConnectArgs {
        let main = ConnectArgs::new(self.url.clone(), self.cookie.clone());
        match key {
            SessionKey::Main => main,
            SessionKey::Team(team_id) => main.for_team(team_id.clone()),
        }
    }
}

impl From<&GatewayConfig> for GatewayOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            url: config.url.clone(),
            cookie: Some(config.auth_cookie.clone()).filter(|cookie| !cookie.is_empty()),
            team_ids: config.team_ids.clone(),
            disable_team_websockets: config.disable_team_websockets,
            connect_timeout: config.connect_timeout(),
            reconnect_base: config.reconnect_base(),
            heartbeat_block_warn: config.heartbeat_block_warn(),
        }
    }
}

/// Supervisor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    Connected,
    /// The main session dropped and is being rebuilt
    Reconnecting,
    Closing,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

struct SupervisorInner {
    connector: Arc<dyn Connector>,
    ctx: SessionContext,
    options: GatewayOptions,
    registry: SessionRegistry,
    ready: watch::Sender<bool>,
    closed: watch::Sender<bool>,
    state: RwLock<SupervisorState>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

/// Owns every gateway session of one client
#[derive(Clone)]
pub struct SessionSupervisor {
    inner: Arc<SupervisorInner>,
}

impl SessionSupervisor {
    pub fn new(connector: Arc<dyn Connector>, router: Arc<EventRouter>, options: GatewayOptions) -> Self {
        let ctx = SessionContext::new(router, options.heartbeat_block_warn);
        Self {
            inner: Arc::new(SupervisorInner {
                connector,
                ctx,
                options,
                registry: SessionRegistry::new(),
                ready: watch::Sender::new(false),
                closed: watch::Sender::new(false),
                state: RwLock::new(SupervisorState::Disconnected),
                loops: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Build the main session and the team sessions, starting each receive loop
    /// as soon as its session is up.
    ///
    /// A main session failure is published as `error` and returned; it is not retried.
    /// Team session failures are published but do not fail the call. If `close` is
    /// called meanwhile, the call returns without marking the gateway ready.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        if self.is_closed() {
            return Err(ConnectError::Transport("supervisor is closed".to_string()));
        }
        if self.state() != SupervisorState::Disconnected {
            tracing::warn!(state = %self.state(), "Gateway already connecting or connected");
            return Ok(());
        }

        self.set_state(SupervisorState::Connecting);
        let mut main = match self.build_session(&SessionKey::Main).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to gateway");
                self.set_state(SupervisorState::Disconnected);
                self.publish_error(e.clone());
                return Err(e);
            }
        };
        if !self.register(&mut main).await {
            tracing::info!("Gateway closed while connecting");
            return Ok(());
        }
        self.spawn_loop(main);
        self.dispatcher().dispatch("connect", vec![]);

        let mut sessions = 1;
        if self.inner.options.disable_team_websockets {
            tracing::debug!("Team sockets disabled");
        } else {
            for team_id in &self.inner.options.team_ids {
                if self.is_closed() {
                    break;
                }
                let key = SessionKey::Team(team_id.clone());
                match self.build_session(&key).await {
                    Ok(mut session) => {
                        if !self.register(&mut session).await {
                            break;
                        }
                        self.spawn_loop(session);
                        self.dispatcher()
                            .dispatch(key.connect_event(), key_args(&key));
                        sessions += 1;
                    }
                    Err(e) => {
                        tracing::warn!(team_id = %team_id, error = %e, "Failed to open team socket");
                        self.publish_error(e);
                    }
                }
            }
        }

        if !self.mark_ready() {
            tracing::info!("Gateway closed while connecting");
            return Ok(());
        }
        tracing::info!(sessions, "Gateway ready");
        self.dispatcher().dispatch("ready", vec![]);
        Ok(())
    }

    /// Connect, then wait until `close` is called
    pub async fn run(&self) -> Result<(), ConnectError> {
        self.connect().await?;
        self.wait_closed().await;
        Ok(())
    }

    /// Close every session, stop reconnecting and clear readiness
    pub async fn close(&self) {
        {
            let mut state = self.inner.state.write();
            if self.inner.closed.send_replace(true) {
                return;
            }
            tracing::debug!(from = %*state, to = %SupervisorState::Closing, "Supervisor state changed");
            *state = SupervisorState::Closing;
        }

        for handle in self.inner.registry.drain() {
            if !handle.close(close_codes::NORMAL).await {
                tracing::debug!(session = %handle.key(), "Session already gone");
            }
        }
        self.inner.ready.send_replace(false);

        let loops = std::mem::take(&mut *self.inner.loops.lock());
        for task in loops {
            let abort = task.abort_handle();
            if tokio::time::timeout(LOOP_SHUTDOWN_GRACE, task).await.is_err() {
                tracing::warn!("Receive loop did not stop in time, aborting");
                abort.abort();
            }
        }

        self.set_state(SupervisorState::Disconnected);
        tracing::info!("Gateway closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    pub async fn wait_closed(&self) {
        wait_for_flag(self.inner.closed.subscribe()).await;
    }

    pub async fn wait_until_ready(&self) {
        wait_for_flag(self.inner.ready.subscribe()).await;
    }

    pub fn state(&self) -> SupervisorState {
        *self.inner.state.read()
    }

    /// Heartbeat latency of the main session
    pub fn latency(&self) -> Option<Duration> {
        self.inner
            .registry
            .get(&SessionKey::Main)
            .and_then(|handle| handle.latency())
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.inner.ctx.router.dispatcher()
    }

    fn set_state(&self, state: SupervisorState) {
        let previous = std::mem::replace(&mut *self.inner.state.write(), state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Supervisor state changed");
        }
    }

    /// Switch to connected and raise readiness unless `close` got there first
    fn mark_ready(&self) -> bool {
        let mut state = self.inner.state.write();
        if self.is_closed() {
            return false;
        }
        if *state != SupervisorState::Connected {
            tracing::debug!(from = %*state, to = %SupervisorState::Connected, "Supervisor state changed");
            *state = SupervisorState::Connected;
        }
        self.inner.ready.send_replace(true);
        true
    }

    /// Add a freshly built session to the registry.
    ///
    /// Once `close` has been called the session is closed here instead and
    /// `false` is returned.
    async fn register(&self, session: &mut GatewaySession) -> bool {
        let key = session.key().clone();
        if !self.is_closed() {
            self.inner.registry.insert(session.handle());
            // `close` raises the flag before draining the registry
            if !self.is_closed() {
                return true;
            }
            self.inner.registry.remove(&key);
        }

        if let Err(e) = session.close(close_codes::NORMAL).await {
            tracing::debug!(session = %key, error = %e, "Close failed");
        }
        false
    }

    fn spawn_loop(&self, session: GatewaySession) {
        let task = tokio::spawn(self.clone().run_session(session));
        self.inner.loops.lock().push(task);
    }

    fn publish_error(&self, err: ConnectError) {
        self.dispatcher()
            .dispatch("error", vec![EventArg::Error(Arc::new(GatewayError::Connect(err)))]);
    }

    async fn build_session(&self, key: &SessionKey) -> Result<GatewaySession, ConnectError> {
        let args = self.inner.options.connect_args(key);
        let limit = self.inner.options.connect_timeout;
        let build = GatewaySession::build(self.inner.connector.as_ref(), &args, self.inner.ctx.clone());

        tokio::time::timeout(limit, build)
            .await
            .unwrap_or(Err(ConnectError::Timeout(limit)))
    }

    /// Receive loop of one session slot
    async fn run_session(self, mut session: GatewaySession) {
        let key = session.key().clone();
        let mut backoff = Backoff::new(self.inner.options.reconnect_base);

        loop {
            let err = poll_until_disconnect(&mut session, &mut backoff).await;
            let code = match &err {
                PollError::Closed { code } => *code,
                _ => session.close_code(),
            };
            self.inner.registry.remove(&key);
            // Dropping the session stops its heartbeat
            drop(session);

            if self.is_closed() {
                break;
            }

            tracing::warn!(
                session = %key,
                code = ?code,
                error = %err,
                "Gateway session disconnected"
            );
            if key == SessionKey::Main {
                self.set_state(SupervisorState::Reconnecting);
            }
            let mut args = key_args(&key);
            args.push(EventArg::CloseCode(code));
            self.dispatcher().dispatch(key.disconnect_event(), args);

            match self.reconnect(&key, &mut backoff).await {
                Some(rebuilt) => session = rebuilt,
                None => break,
            }
        }

        tracing::debug!(session = %key, "Receive loop finished");
    }

    /// Rebuild a session until it succeeds or the supervisor closes
    async fn reconnect(&self, key: &SessionKey, backoff: &mut Backoff) -> Option<GatewaySession> {
        loop {
            let delay = backoff.next_delay();
            tracing::info!(
                session = %key,
                attempt = backoff.attempts(),
                backoff_secs = delay.as_secs_f64(),
                "Reconnecting after backoff"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.wait_closed() => return None,
            }

            match self.build_session(key).await {
                Ok(mut session) => {
                    if !self.register(&mut session).await {
                        return None;
                    }
                    if *key == SessionKey::Main {
                        self.mark_ready();
                    }
                    tracing::info!(session = %key, "Gateway session reconnected");
                    self.dispatcher().dispatch(key.connect_event(), key_args(key));
                    return Some(session);
                }
                Err(e) => {
                    tracing::warn!(session = %key, error = %e, "Reconnect attempt failed");
                }
            }
        }
    }
}

impl fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("state", &self.state())
            .field("sessions", &self.inner.registry.keys())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Poll until the session is gone. Any other outcome counts as a healthy poll.
async fn poll_until_disconnect(session: &mut GatewaySession, backoff: &mut Backoff) -> PollError {
    loop {
        match session.poll_event().await {
            Ok(()) => backoff.reset(),
            Err(e) if e.is_disconnect() => return e,
            Err(e) => {
                backoff.reset();
                tracing::warn!(session = %session.key(), error = %e, "Failed to handle gateway frame");
            }
        }
    }
}

/// Leading arguments of the connect/disconnect events for `key`
fn key_args(key: &SessionKey) -> EventArgs {
    key.team_id()
        .map(|team_id| vec![EventArg::Id(team_id.to_string())])
        .unwrap_or_default()
}

async fn wait_for_flag(mut flag: watch::Receiver<bool>) {
    loop {
        let set = *flag.borrow_and_update();
        if set {
            return;
        }
        if flag.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::{hello, hello_with_interval, MockConnector};
    use guilded_cache::{CacheOptions, CacheStore, NullFetcher, Resolver};
    use tokio::time::Instant;

    const WAIT: Option<Duration> = Some(Duration::from_secs(300));

    fn supervisor(connector: Arc<MockConnector>, options: GatewayOptions) -> SessionSupervisor {
        let cache = CacheStore::new_shared(CacheOptions::default());
        let router = EventRouter::new(Resolver::new(cache, Arc::new(NullFetcher)), Dispatcher::new());
        SessionSupervisor::new(connector, Arc::new(router), options)
    }

    fn options() -> GatewayOptions {
        GatewayOptions::new("ws://gateway.test")
    }

    #[tokio::test]
    async fn test_connect_publishes_connect_then_ready() {
        let connector = Arc::new(MockConnector::new());
        let _server = connector.script_ready("s1");
        let supervisor = supervisor(connector.clone(), options());

        let connected = supervisor.dispatcher().wait_for("connect", WAIT);
        let ready = supervisor.dispatcher().wait_for("ready", WAIT);
        supervisor.connect().await.unwrap();

        connected.await.unwrap();
        ready.await.unwrap();
        assert!(supervisor.is_ready());
        assert_eq!(supervisor.state(), SupervisorState::Connected);
        assert!(supervisor.registry().contains(&SessionKey::Main));

        supervisor.close().await;
    }

    #[tokio::test]
    async fn test_main_connect_failure_is_terminal() {
        let connector = Arc::new(MockConnector::new());
        connector.fail_next(ConnectError::Handshake { status: 401 });
        let supervisor = supervisor(connector.clone(), options());

        let error = supervisor.dispatcher().wait_for("error", WAIT);
        let err = supervisor.connect().await.unwrap_err();

        assert!(matches!(err, ConnectError::Handshake { status: 401 }));
        let arg = error.await.unwrap().into_single().unwrap();
        assert!(matches!(arg.as_error(), Some(GatewayError::Connect(_))));
        assert_eq!(supervisor.state(), SupervisorState::Disconnected);
        assert!(!supervisor.is_ready());
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn test_team_sessions_are_opened() {
        let connector = Arc::new(MockConnector::new());
        let _main = connector.script_ready("s1");
        let _team = connector.script_ready("s2");
        let supervisor = supervisor(connector.clone(), options().with_team_ids(vec!["t1".into()]));

        let team_connected = supervisor.dispatcher().wait_for("team_connect", WAIT);
        supervisor.connect().await.unwrap();

        let arg = team_connected.await.unwrap().into_single().unwrap();
        assert_eq!(arg.as_str(), Some("t1"));
        assert_eq!(connector.attempted_teams(), vec![None, Some("t1".to_string())]);
        assert!(supervisor.registry().contains(&SessionKey::Team("t1".into())));

        supervisor.close().await;
    }

    #[tokio::test]
    async fn test_team_failure_does_not_abort_connect() {
        let connector = Arc::new(MockConnector::new());
        let _main = connector.script_ready("s1");
        connector.fail_next(ConnectError::Handshake { status: 403 });
        let supervisor = supervisor(connector.clone(), options().with_team_ids(vec!["t1".into()]));

        let error = supervisor.dispatcher().wait_for("error", WAIT);
        supervisor.connect().await.unwrap();

        assert!(error.await.is_ok());
        assert!(supervisor.is_ready());
        assert_eq!(supervisor.registry().len(), 1);

        supervisor.close().await;
    }

    #[tokio::test]
    async fn test_main_heartbeats_while_team_sockets_connect() {
        let connector = Arc::new(MockConnector::new());
        let main = connector.script();
        main.push_text(&hello_with_interval("s1", 50));
        let _team = connector.script_ready("s2");
        connector.delay_teams(Duration::from_millis(600));
        let supervisor = supervisor(connector.clone(), options().with_team_ids(vec!["t1".into()]));

        supervisor.connect().await.unwrap();

        let heartbeats = main.sent().iter().filter(|frame| *frame == "2").count();
        assert!(heartbeats >= 4, "only {heartbeats} heartbeats while the team socket connected");

        supervisor.close().await;
    }

    #[tokio::test]
    async fn test_close_during_connect_skips_ready() {
        let connector = Arc::new(MockConnector::new());
        let main = connector.script_ready("s1");
        let team = connector.script_ready("s2");
        connector.delay_teams(Duration::from_millis(300));
        let supervisor = supervisor(connector.clone(), options().with_team_ids(vec!["t1".into()]));

        let connected = supervisor.dispatcher().wait_for("connect", WAIT);
        let ready = supervisor.dispatcher().wait_for("ready", Some(Duration::from_millis(800)));
        let connecting = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.connect().await }
        });

        connected.await.unwrap();
        tokio::time::timeout(Duration::from_millis(200), supervisor.close())
            .await
            .expect("close waited for connect");
        connecting.await.unwrap().unwrap();

        assert!(ready.await.is_err());
        assert!(!supervisor.is_ready());
        assert_eq!(supervisor.state(), SupervisorState::Disconnected);
        assert!(supervisor.registry().is_empty());
        assert_eq!(main.closed_with(), Some(close_codes::NORMAL));
        assert_eq!(team.closed_with(), Some(close_codes::NORMAL));
        assert_eq!(team.sent().last().map(String::as_str), Some(r#"42["logout"]"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_disconnect() {
        let connector = Arc::new(MockConnector::new());
        let first = connector.script_ready("s1");
        let second = connector.script_ready("s2");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let disconnected = supervisor.dispatcher().wait_for("disconnect", WAIT);
        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        let start = Instant::now();
        first.close(Some(close_codes::ABNORMAL));

        let arg = disconnected.await.unwrap().into_single().unwrap();
        assert!(matches!(arg, EventArg::CloseCode(Some(1006))));
        reconnected.await.unwrap();

        assert_eq!(start.elapsed().as_secs(), 5);
        assert_eq!(connector.attempts(), 2);
        assert_eq!(supervisor.state(), SupervisorState::Connected);

        supervisor.close().await;
        assert_eq!(second.closed_with(), Some(close_codes::NORMAL));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_grows_backoff() {
        let connector = Arc::new(MockConnector::new());
        let first = connector.script_ready("s1");
        connector.fail_next(ConnectError::Transport("refused".into()));
        let _second = connector.script_ready("s2");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        let start = Instant::now();
        first.close(None);
        reconnected.await.unwrap();

        // 5s before the failed attempt, 10s before the next one
        assert_eq!(start.elapsed().as_secs(), 15);
        assert_eq!(connector.attempts(), 3);

        supervisor.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_poll_after_reconnect_resets_backoff() {
        let connector = Arc::new(MockConnector::new());
        let first = connector.script_ready("s1");
        connector.fail_next(ConnectError::Transport("refused".into()));
        let second = connector.script_ready("s2");
        let _third = connector.script_ready("s3");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        first.close(None);
        reconnected.await.unwrap();

        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        let start = Instant::now();
        second.push_text("40");
        second.close(None);
        reconnected.await.unwrap();

        assert_eq!(start.elapsed().as_secs(), 5);
        assert_eq!(connector.attempts(), 4);

        supervisor.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_handshake_keeps_backoff() {
        let connector = Arc::new(MockConnector::new());
        let first = connector.script_ready("s1");
        connector.fail_next(ConnectError::Transport("refused".into()));
        let second = connector.script_ready("s2");
        let _third = connector.script_ready("s3");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        first.close(None);
        reconnected.await.unwrap();

        let reconnected = supervisor.dispatcher().wait_for("connect", WAIT);
        let start = Instant::now();
        second.close(None);
        reconnected.await.unwrap();

        // Third attempt in a row without a healthy poll
        assert_eq!(start.elapsed().as_secs(), 15);
        assert_eq!(connector.attempts(), 4);

        supervisor.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_rebuilt_after_close_is_logged_out() {
        let connector = Arc::new(MockConnector::new());
        let first = connector.script_ready("s1");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let disconnected = supervisor.dispatcher().wait_for("disconnect", WAIT);
        let second = connector.script();
        first.close(None);
        disconnected.await.unwrap();

        // The rebuild is now waiting for its handshake
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(connector.attempts(), 2);

        let closing = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.close().await }
        });
        tokio::task::yield_now().await;
        assert!(supervisor.is_closed());

        second.push_text(&hello("s2"));
        closing.await.unwrap();

        assert!(supervisor.registry().is_empty());
        assert_eq!(supervisor.state(), SupervisorState::Disconnected);
        assert_eq!(second.closed_with(), Some(close_codes::NORMAL));
        assert_eq!(second.sent().last().map(String::as_str), Some(r#"42["logout"]"#));
    }

    #[tokio::test]
    async fn test_close_stops_everything() {
        let connector = Arc::new(MockConnector::new());
        let server = connector.script_ready("s1");
        let supervisor = supervisor(connector.clone(), options());
        supervisor.connect().await.unwrap();

        let disconnected = supervisor.dispatcher().wait_for("disconnect", Some(Duration::from_millis(50)));
        supervisor.close().await;

        assert!(supervisor.is_closed());
        assert!(!supervisor.is_ready());
        assert!(supervisor.registry().is_empty());
        assert_eq!(supervisor.state(), SupervisorState::Disconnected);
        assert_eq!(server.closed_with(), Some(close_codes::NORMAL));
        assert_eq!(server.sent().last().map(String::as_str), Some(r#"42["logout"]"#));
        assert_eq!(disconnected.await.unwrap_err(), crate::WaitError::Timeout(Duration::from_millis(50)));
        assert_eq!(connector.attempts(), 1);
        assert!(supervisor.connect().await.is_err());
    }
}
