//! Client facade
//!
//! Wires the cache, resolver, dispatcher, router and supervisor together and
//! exposes the application-facing surface.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use guilded_cache::{CacheOptions, CacheStore, EntityFetcher, NullFetcher, Resolver, SharedCacheStore};
use guilded_core::{Channel, Message, Team, User};

use crate::broadcast::{Dispatcher, EventArg, EventArgs, ListenerResult, WaitResult};
use crate::connection::{Connector, TungsteniteConnector};
use crate::error::{ConnectError, WaitError};
use crate::handlers::EventRouter;
use crate::supervisor::{GatewayOptions, SessionSupervisor, SupervisorState};

/// Builder for [`Client`]
pub struct ClientBuilder {
    options: GatewayOptions,
    connector: Option<Arc<dyn Connector>>,
    fetcher: Option<Arc<dyn EntityFetcher>>,
    cache_options: CacheOptions,
}

impl ClientBuilder {
    pub fn new(options: GatewayOptions) -> Self {
        Self {
            options,
            connector: None,
            fetcher: None,
            cache_options: CacheOptions::default(),
        }
    }

    /// Socket connector; defaults to [`TungsteniteConnector`]
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Network fallback for cache misses; defaults to cache-only lookups
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn EntityFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn cache_options(mut self, options: CacheOptions) -> Self {
        self.cache_options = options;
        self
    }

    pub fn build(self) -> Client {
        let cache = CacheStore::new_shared(self.cache_options);
        let fetcher = self.fetcher.unwrap_or_else(|| Arc::new(NullFetcher));
        let connector = self.connector.unwrap_or_else(|| Arc::new(TungsteniteConnector));

        let dispatcher = Dispatcher::new();
        let router = EventRouter::new(Resolver::new(cache.clone(), fetcher), dispatcher.clone());
        let supervisor = SessionSupervisor::new(connector, Arc::new(router), self.options);

        Client {
            cache,
            dispatcher,
            supervisor,
        }
    }
}

/// Gateway client
#[derive(Clone)]
pub struct Client {
    cache: SharedCacheStore,
    dispatcher: Dispatcher,
    supervisor: SessionSupervisor,
}

impl Client {
    pub fn builder(options: GatewayOptions) -> ClientBuilder {
        ClientBuilder::new(options)
    }

    /// Register the persistent handler for `event` (`message` or `on_message`).
    ///
    /// Returns whether a previous handler was replaced.
    pub fn event<F, Fut>(&self, event: &str, handler: F) -> bool
    where
        F: Fn(EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        self.dispatcher.register_handler(event, handler)
    }

    pub fn dispatch(&self, event: &str, args: EventArgs) {
        self.dispatcher.dispatch(event, args);
    }

    /// Wait for the next `event`; registered immediately, not on first poll
    pub fn wait_for(
        &self,
        event: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<WaitResult, WaitError>> + Send + 'static {
        self.dispatcher.wait_for(event, timeout)
    }

    /// Wait for the next `event` whose arguments pass `check`
    pub fn wait_for_match<F>(
        &self,
        event: &str,
        check: F,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<WaitResult, WaitError>> + Send + 'static
    where
        F: Fn(&[EventArg]) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.dispatcher.wait_for_match(event, check, timeout)
    }

    pub async fn connect(&self) -> Result<(), ConnectError> {
        self.supervisor.connect().await
    }

    /// Connect and block until [`Client::close`] is called
    pub async fn run(&self) -> Result<(), ConnectError> {
        self.supervisor.run().await
    }

    /// Close every session with a normal close code
    pub async fn close(&self) {
        self.supervisor.close().await;
    }

    pub fn is_ready(&self) -> bool {
        self.supervisor.is_ready()
    }

    pub async fn wait_until_ready(&self) {
        self.supervisor.wait_until_ready().await;
    }

    pub fn is_closed(&self) -> bool {
        self.supervisor.is_closed()
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Heartbeat round-trip of the main session, once measured
    pub fn latency(&self) -> Option<Duration> {
        self.supervisor.latency()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn supervisor(&self) -> &SessionSupervisor {
        &self.supervisor
    }

    pub fn get_message(&self, message_id: &str) -> Option<Message> {
        self.cache.get_message(message_id)
    }

    pub fn get_team(&self, team_id: &str) -> Option<Team> {
        self.cache.get_team(team_id)
    }

    /// Team or DM channel
    pub fn get_channel(&self, channel_id: &str) -> Option<Channel> {
        self.cache.get_channel(channel_id)
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.cache.get_user(user_id)
    }

    pub fn cached_messages(&self) -> Vec<Message> {
        self.cache.cached_messages()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("supervisor", &self.supervisor)
            .field("cached_messages", &self.cache.message_count())
            .finish()
    }
}
