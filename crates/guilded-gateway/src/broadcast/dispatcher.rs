//! Event dispatcher
//!
//! Process-wide publish/subscribe hub. Every `dispatch` first resolves the
//! one-shot waiters registered for the event (in registration order), then
//! schedules the persistent handler for that event as its own task.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::{EventArg, EventArgs, WaitResult};
use crate::error::{GatewayError, WaitError};

/// Error a persistent handler may return
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a persistent handler
pub type ListenerResult = Result<(), ListenerError>;

type Listener = Arc<dyn Fn(EventArgs) -> BoxFuture<'static, ListenerResult> + Send + Sync>;
type Check = Box<dyn Fn(&[EventArg]) -> Result<bool, String> + Send + Sync>;
type WaitOutcome = Result<WaitResult, WaitError>;

/// A pending `wait_for` call
struct Waiter {
    id: u64,
    slot: Option<oneshot::Sender<WaitOutcome>>,
    check: Option<Check>,
}

impl Waiter {
    /// Offer the event to this waiter. Returns whether it stays registered.
    fn offer(&mut self, args: &[EventArg]) -> bool {
        let Some(slot) = self.slot.take() else {
            return false;
        };
        // The caller timed out or dropped the wait
        if slot.is_closed() {
            return false;
        }

        let verdict = match &self.check {
            None => Ok(true),
            Some(check) => std::panic::catch_unwind(AssertUnwindSafe(|| check(args)))
                .unwrap_or_else(|panic| Err(panic_message(panic.as_ref()))),
        };

        match verdict {
            Ok(true) => {
                let _ = slot.send(Ok(WaitResult::from_args(args.to_vec())));
                false
            }
            Ok(false) => {
                self.slot = Some(slot);
                true
            }
            Err(reason) => {
                let _ = slot.send(Err(WaitError::Check(reason)));
                false
            }
        }
    }
}

struct DispatcherInner {
    /// Persistent handlers by lower-cased event name
    listeners: RwLock<HashMap<String, Listener>>,
    /// Waiters by lower-cased event name, in registration order
    waiters: Mutex<HashMap<String, Vec<Waiter>>>,
    next_waiter_id: AtomicU64,
}

/// Event dispatcher handle (cheap to clone)
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Create a new dispatcher
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                listeners: RwLock::new(HashMap::new()),
                waiters: Mutex::new(HashMap::new()),
                next_waiter_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register the persistent handler for an event.
    ///
    /// `event` may be given as `message` or `on_message`. Registering again for
    /// the same event replaces the previous handler; returns whether one was replaced.
    pub fn register_handler<F, Fut>(&self, event: &str, handler: F) -> bool
    where
        F: Fn(EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        let name = handler_event_name(event);
        let listener: Listener = Arc::new(move |args| handler(args).boxed());
        let replaced = self
            .inner
            .listeners
            .write()
            .insert(name.clone(), listener)
            .is_some();

        tracing::debug!(event = %name, replaced, "Event handler registered");
        replaced
    }

    /// Remove the persistent handler for an event
    pub fn remove_handler(&self, event: &str) -> bool {
        self.inner
            .listeners
            .write()
            .remove(&handler_event_name(event))
            .is_some()
    }

    pub fn has_handler(&self, event: &str) -> bool {
        self.inner
            .listeners
            .read()
            .contains_key(&handler_event_name(event))
    }

    /// Publish an event.
    ///
    /// Never suspends: waiters are resolved inline and the handler is spawned.
    /// Outside a tokio runtime, waiters still resolve but the handler is skipped.
    pub fn dispatch(&self, event: &str, args: EventArgs) {
        let name = event.to_lowercase();
        tracing::trace!(event = %name, args = args.len(), "Dispatching event");

        self.resolve_waiters(&name, &args);

        let listener = self.inner.listeners.read().get(&name).cloned();
        if let Some(listener) = listener {
            self.schedule(name, listener, args);
        }
    }

    /// Wait for the next dispatch of `event`.
    ///
    /// The waiter is registered when this is called, not when the future is
    /// first polled. Dropping the future deregisters it.
    pub fn wait_for(
        &self,
        event: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = WaitOutcome> + Send + 'static {
        self.register_waiter(event, None, timeout)
    }

    /// Wait for the next dispatch of `event` whose arguments pass `check`.
    ///
    /// A check that returns `Err` fails the wait with [`WaitError::Check`].
    /// Checks run while the waiter table is locked and must not call back
    /// into the dispatcher.
    pub fn wait_for_match<F>(
        &self,
        event: &str,
        check: F,
        timeout: Option<Duration>,
    ) -> impl Future<Output = WaitOutcome> + Send + 'static
    where
        F: Fn(&[EventArg]) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.register_waiter(event, Some(Box::new(check)), timeout)
    }

    /// Number of waiters registered for an event
    pub fn waiter_count(&self, event: &str) -> usize {
        self.inner
            .waiters
            .lock()
            .get(&event.to_lowercase())
            .map_or(0, Vec::len)
    }

    fn register_waiter(
        &self,
        event: &str,
        check: Option<Check>,
        timeout: Option<Duration>,
    ) -> impl Future<Output = WaitOutcome> + Send + 'static {
        let name = event.to_lowercase();
        let id = self.inner.next_waiter_id.fetch_add(1, Ordering::Relaxed);
        let (slot, rx) = oneshot::channel();

        self.inner
            .waiters
            .lock()
            .entry(name.clone())
            .or_default()
            .push(Waiter {
                id,
                slot: Some(slot),
                check,
            });

        let guard = WaiterGuard {
            inner: Arc::downgrade(&self.inner),
            event: name,
            id,
        };

        async move {
            let _guard = guard;
            let received = match timeout {
                Some(limit) => tokio::time::timeout(limit, rx)
                    .await
                    .map_err(|_| WaitError::Timeout(limit))?,
                None => rx.await,
            };
            received.map_err(|_| WaitError::Dropped)?
        }
    }

    fn resolve_waiters(&self, event: &str, args: &[EventArg]) {
        let mut waiters = self.inner.waiters.lock();
        let Some(pending) = waiters.get_mut(event) else {
            return;
        };

        pending.retain_mut(|waiter| waiter.offer(args));
        if pending.is_empty() {
            waiters.remove(event);
        }
    }

    fn schedule(&self, event: String, listener: Listener, args: EventArgs) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(event = %event, "No async runtime, skipping event handler");
            return;
        };

        let dispatcher = self.clone();
        runtime.spawn(async move {
            let outcome = AssertUnwindSafe(async move { listener(args).await })
                .catch_unwind()
                .await;

            let message = match outcome {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            dispatcher.report_failure(&event, message);
        });
    }

    /// Log a handler failure and republish it as `error`
    fn report_failure(&self, event: &str, message: String) {
        tracing::error!(event = %event, error = %message, "Event handler failed");

        // A failing error handler is only logged
        if event == "error" {
            return;
        }

        let err = GatewayError::Listener {
            event: event.to_string(),
            message,
        };
        self.dispatch("error", vec![EventArg::Error(Arc::new(err))]);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.inner.listeners.read().len())
            .field("waiting_events", &self.inner.waiters.lock().len())
            .finish()
    }
}

/// Deregisters a waiter when its future completes or is dropped
struct WaiterGuard {
    inner: Weak<DispatcherInner>,
    event: String,
    id: u64,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut waiters = inner.waiters.lock();
        if let Some(pending) = waiters.get_mut(&self.event) {
            pending.retain(|waiter| waiter.id != self.id);
            if pending.is_empty() {
                waiters.remove(&self.event);
            }
        }
    }
}

/// `on_message` and `Message` both name the `message` event
fn handler_event_name(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_prefix("on_") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_waiters_resolve_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let waits: Vec<_> = (0..3)
            .map(|i| {
                let order = order.clone();
                dispatcher.wait_for_match(
                    "typing",
                    move |_| {
                        order.lock().push(i);
                        Ok(true)
                    },
                    None,
                )
            })
            .collect();

        dispatcher.dispatch("typing", vec![EventArg::Id("c1".into())]);

        for wait in waits {
            let result = wait.await.unwrap();
            assert_eq!(result.into_single().unwrap().as_str(), Some("c1"));
        }
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(dispatcher.waiter_count("typing"), 0);
    }

    #[tokio::test]
    async fn test_wait_result_arity() {
        let dispatcher = Dispatcher::new();

        let none = dispatcher.wait_for("ready", None);
        dispatcher.dispatch("ready", vec![]);
        assert!(none.await.unwrap().is_none());

        let many = dispatcher.wait_for("member_update", None);
        dispatcher.dispatch("member_update", vec![EventArg::Int(1), EventArg::Int(2)]);
        assert_eq!(many.await.unwrap().into_vec().len(), 2);
    }

    #[tokio::test]
    async fn test_event_names_are_case_insensitive() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for("Message", None);
        dispatcher.dispatch("MESSAGE", vec![]);
        assert!(wait.await.is_ok());
    }

    #[tokio::test]
    async fn test_non_matching_waiter_stays_registered() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for_match(
            "typing",
            |args| Ok(args.first().and_then(EventArg::as_str) == Some("c2")),
            None,
        );

        dispatcher.dispatch("typing", vec![EventArg::Id("c1".into())]);
        assert_eq!(dispatcher.waiter_count("typing"), 1);

        dispatcher.dispatch("typing", vec![EventArg::Id("c2".into())]);
        assert!(wait.await.is_ok());
        assert_eq!(dispatcher.waiter_count("typing"), 0);
    }

    #[tokio::test]
    async fn test_failing_check_rejects_only_that_waiter() {
        let dispatcher = Dispatcher::new();
        let failing = dispatcher.wait_for_match("message", |_| Err("bad check".to_string()), None);
        let passing = dispatcher.wait_for("message", None);

        dispatcher.dispatch("message", vec![EventArg::Int(1)]);

        assert_eq!(failing.await.unwrap_err(), WaitError::Check("bad check".to_string()));
        assert!(passing.await.is_ok());
    }

    #[tokio::test]
    async fn test_panicking_check_rejects_waiter() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for_match("message", |_| panic!("boom"), None);
        dispatcher.dispatch("message", vec![]);
        assert_eq!(wait.await.unwrap_err(), WaitError::Check("boom".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_deregisters_waiter() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for("message", Some(Duration::from_secs(5)));
        assert_eq!(dispatcher.waiter_count("message"), 1);

        assert_eq!(wait.await.unwrap_err(), WaitError::Timeout(Duration::from_secs(5)));
        assert_eq!(dispatcher.waiter_count("message"), 0);
    }

    #[tokio::test]
    async fn test_dropped_wait_is_deregistered() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for("message", None);
        drop(wait);
        assert_eq!(dispatcher.waiter_count("message"), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_drop_fails_wait() {
        let dispatcher = Dispatcher::new();
        let wait = dispatcher.wait_for("message", None);
        drop(dispatcher);
        assert_eq!(wait.await.unwrap_err(), WaitError::Dropped);
    }

    #[tokio::test]
    async fn test_handler_receives_args() {
        let dispatcher = Dispatcher::new();
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));

        dispatcher.register_handler("on_typing", move |args| {
            let tx = tx.lock().take();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(args.len());
                }
                Ok(())
            }
        });

        dispatcher.dispatch("typing", vec![EventArg::Id("c1".into()), EventArg::Id("u1".into())]);
        assert_eq!(rx.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reregistering_replaces_handler() {
        let dispatcher = Dispatcher::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        assert!(!dispatcher.register_handler("on_ready", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));
        let counter = second.clone();
        assert!(dispatcher.register_handler("ready", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));

        let done = dispatcher.wait_for("ready", None);
        dispatcher.dispatch("ready", vec![]);
        done.await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_error_is_published() {
        let dispatcher = Dispatcher::new();
        dispatcher.register_handler("message", |_| async { Err("handler broke".into()) });

        let error = dispatcher.wait_for("error", Some(Duration::from_secs(5)));
        dispatcher.dispatch("message", vec![]);

        let arg = error.await.unwrap().into_single().unwrap();
        match arg.as_error() {
            Some(GatewayError::Listener { event, message }) => {
                assert_eq!(event, "message");
                assert_eq!(message, "handler broke");
            }
            other => panic!("unexpected error argument: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let dispatcher = Dispatcher::new();
        dispatcher.register_handler("message", |_| async { panic!("handler panicked") });

        let error = dispatcher.wait_for("error", Some(Duration::from_secs(5)));
        dispatcher.dispatch("message", vec![]);

        let arg = error.await.unwrap().into_single().unwrap();
        assert!(matches!(
            arg.as_error(),
            Some(GatewayError::Listener { message, .. }) if message == "handler panicked"
        ));
    }

    #[tokio::test]
    async fn test_failing_error_handler_is_not_republished() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        dispatcher.register_handler("error", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err("error handler broke".into()) }
        });

        dispatcher.dispatch("error", vec![]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_outside_runtime_resolves_waiters() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        dispatcher.register_handler("message", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        let wait = dispatcher.wait_for("message", None);
        dispatcher.dispatch("message", vec![EventArg::Int(7)]);

        let result = futures::executor::block_on(wait).unwrap();
        assert!(matches!(result.into_single(), Some(EventArg::Int(7))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
