//! Graceful shutdown coordination.
//!
//! Shutdown is triggered by either an OS signal (SIGTERM, SIGINT) or an
//! in-band request to `/shutdown`. Whichever fires first moves the
//! [`ShutdownCoordinator`] from `Running` to `Draining`; later triggers are
//! no-ops. While draining, the listener stops accepting connections and
//! in-flight requests get a bounded grace period. The coordinator then
//! moves to `Stopped` and publishes a [`ShutdownReport`] exactly once.
//!
//! # Example
//!
//! ```rust,ignore
//! use docstore_server::ShutdownCoordinator;
//! use std::time::Duration;
//!
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
//! coordinator.listen_for_os_signals();
//!
//! // Elsewhere: serve until draining, then drain the tracker.
//! let report = coordinator.wait_stopped().await;
//! tracing::info!(outcome = ?report.outcome, "stopped");
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

/// Default grace period for in-flight requests.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// A single-use signal that can be triggered and awaited.
///
/// The first call to [`trigger`](Self::trigger) wins; every later call
/// returns `false` and notifies nobody.
///
/// # Example
///
/// ```rust
/// use docstore_server::shutdown::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let clone = shutdown.clone();
///
/// assert!(shutdown.trigger());
/// assert!(!clone.trigger());
/// assert!(clone.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers the signal, returning `true` only for the call that won.
    pub fn trigger(&self) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine
            let _ = self.sender.send(());
            true
        } else {
            false
        }
    }

    /// Returns `true` if the signal has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Returns a future that completes once the signal is triggered.
    ///
    /// Completes immediately if it already was.
    pub fn recv(&self) -> ShutdownReceiver {
        let mut receiver = self.sender.subscribe();
        ShutdownReceiver {
            triggered: Arc::clone(&self.triggered),
            notified: Box::pin(async move {
                // A closed channel also means no trigger can follow
                let _ = receiver.recv().await;
            }),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A future that completes when a [`ShutdownSignal`] is triggered.
pub struct ShutdownReceiver {
    triggered: Arc<AtomicBool>,
    notified: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl fmt::Debug for ShutdownReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownReceiver")
            .field("triggered", &self.triggered.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Future for ShutdownReceiver {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Fast path: already triggered
        if self.triggered.load(Ordering::SeqCst) {
            return Poll::Ready(());
        }

        match self.notified.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(()),
            Poll::Pending => {
                // The flag may have flipped between the load and the subscribe.
                if self.triggered.load(Ordering::SeqCst) {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

/// Waits for SIGTERM or SIGINT and returns the name of the one received.
///
/// If the handlers cannot be installed the failure is logged and the
/// future never completes, leaving the in-band trigger as the only way
/// to stop.
async fn wait_for_os_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let handlers = signal(SignalKind::terminate())
            .and_then(|term| signal(SignalKind::interrupt()).map(|int| (term, int)));

        let (mut sigterm, mut sigint) = match handlers {
            Ok(handlers) => handlers,
            Err(e) => {
                tracing::error!(error = %e, "Failed to register signal handlers");
                return std::future::pending().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to wait for Ctrl+C");
            return std::future::pending().await;
        }
        "CTRL_C"
    }
}

/// Tracks active connections so shutdown can wait for them.
///
/// # Example
///
/// ```rust
/// use docstore_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a new connection tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Acquires a token to hold for the lifetime of a connection.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of active connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until all connections are closed.
    pub async fn wait_for_shutdown(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownState {
    /// Accepting connections.
    Running,
    /// No longer accepting; waiting for in-flight requests.
    Draining,
    /// Drain finished or the grace period expired.
    Stopped,
}

/// What started the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// An OS signal, by name.
    Signal(&'static str),
    /// An in-band request to the shutdown route.
    Request,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => write!(f, "signal {name}"),
            Self::Request => f.write_str("shutdown request"),
        }
    }
}

/// How draining ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection closed within the grace period.
    Drained,
    /// The grace period expired with connections still open.
    TimedOut {
        /// Connections still open at expiry.
        remaining: usize,
    },
}

impl DrainOutcome {
    /// Returns `true` if the grace period expired.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Published once when the coordinator reaches `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// What started the shutdown.
    pub trigger: ShutdownTrigger,
    /// How draining ended.
    pub outcome: DrainOutcome,
    /// Time from trigger to stop.
    pub elapsed: Duration,
}

struct Inner {
    grace: Duration,
    signal: ShutdownSignal,
    triggered_by: Mutex<Option<(ShutdownTrigger, Instant)>>,
    stopped: AtomicBool,
    state: watch::Sender<ShutdownState>,
    report: watch::Sender<Option<ShutdownReport>>,
}

/// Drives the `Running -> Draining -> Stopped` state machine.
///
/// Cloning is cheap; all clones share one state machine.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("grace", &self.inner.grace)
            .field("state", &self.state())
            .finish()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ShutdownCoordinator {
    /// Creates a coordinator in the `Running` state.
    #[must_use]
    pub fn new(grace: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        let (report, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                grace,
                signal: ShutdownSignal::new(),
                triggered_by: Mutex::new(None),
                stopped: AtomicBool::new(false),
                state,
                report,
            }),
        }
    }

    /// Returns the grace period.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.inner.grace
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        *self.inner.state.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.inner.state.subscribe()
    }

    /// Returns the trigger that won, if shutdown has started.
    #[must_use]
    pub fn trigger_cause(&self) -> Option<ShutdownTrigger> {
        let cause = *self.inner.triggered_by.lock();
        cause.map(|(trigger, _)| trigger)
    }

    /// Requests shutdown in-band.
    ///
    /// Returns `true` if this call started the drain, `false` if shutdown
    /// was already under way.
    pub fn request_shutdown(&self) -> bool {
        self.trigger(ShutdownTrigger::Request)
    }

    fn trigger(&self, trigger: ShutdownTrigger) -> bool {
        // Held across the CAS so readers never see the flag without the cause.
        let mut slot = self.inner.triggered_by.lock();
        if !self.inner.signal.trigger() {
            tracing::debug!(%trigger, "Shutdown already in progress, ignoring trigger");
            return false;
        }
        *slot = Some((trigger, Instant::now()));
        drop(slot);

        self.inner.state.send_replace(ShutdownState::Draining);
        tracing::info!(
            %trigger,
            grace_ms = self.inner.grace.as_millis() as u64,
            "Initiating graceful shutdown"
        );
        true
    }

    /// Spawns a task that triggers shutdown on SIGTERM or SIGINT.
    ///
    /// The task exits without triggering if shutdown starts another way.
    pub fn listen_for_os_signals(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                name = wait_for_os_signal() => {
                    coordinator.trigger(ShutdownTrigger::Signal(name));
                }
                () = coordinator.draining() => {}
            }
        })
    }

    /// Returns a future that completes once draining starts.
    pub fn draining(&self) -> ShutdownReceiver {
        self.inner.signal.recv()
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.inner.signal.is_shutdown()
    }

    /// Waits for draining to start, then for `tracker` to empty or the
    /// grace period to expire, and moves to `Stopped`.
    ///
    /// Only the first call publishes a [`ShutdownReport`].
    pub async fn drain(&self, tracker: &ConnectionTracker) -> DrainOutcome {
        self.draining().await;

        tracing::info!(
            active_connections = tracker.active_connections(),
            "Draining in-flight requests"
        );

        let outcome =
            match tokio::time::timeout(self.inner.grace, tracker.wait_for_shutdown()).await {
                Ok(()) => DrainOutcome::Drained,
                Err(_) => {
                    let remaining = tracker.active_connections();
                    tracing::warn!(
                        remaining_connections = remaining,
                        grace_ms = self.inner.grace.as_millis() as u64,
                        "Grace period expired with requests still in flight"
                    );
                    DrainOutcome::TimedOut { remaining }
                }
            };

        self.complete(outcome);
        outcome
    }

    fn complete(&self, outcome: DrainOutcome) {
        if self
            .inner
            .stopped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let cause = *self.inner.triggered_by.lock();
        let (trigger, started) = cause.unwrap_or((ShutdownTrigger::Request, Instant::now()));

        let report = ShutdownReport {
            trigger,
            outcome,
            elapsed: started.elapsed(),
        };

        self.inner.state.send_replace(ShutdownState::Stopped);
        self.inner.report.send_replace(Some(report));
        tracing::info!(
            %trigger,
            outcome = ?outcome,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Shutdown complete"
        );
    }

    /// Waits for the coordinator to reach `Stopped` and returns the report.
    pub async fn wait_stopped(&self) -> ShutdownReport {
        let mut rx = self.inner.report.subscribe();
        loop {
            if let Some(report) = *rx.borrow_and_update() {
                return report;
            }
            // The sender lives in `self.inner`, so this cannot fail here.
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Returns the report if the coordinator has stopped.
    #[must_use]
    pub fn report(&self) -> Option<ShutdownReport> {
        *self.inner.report.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_signal_trigger_once() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown());

        assert!(signal.trigger());
        assert!(!signal.trigger());
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_shutdown_signal_clone() {
        let signal1 = ShutdownSignal::new();
        let signal2 = signal1.clone();

        signal1.trigger();

        assert!(signal2.is_shutdown());
        assert!(!signal2.trigger());
    }

    #[tokio::test]
    async fn test_shutdown_recv_completes_when_triggered() {
        let signal = ShutdownSignal::new();
        let signal_clone = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal_clone.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[tokio::test]
    async fn test_shutdown_recv_completes_immediately_if_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[tokio::test]
    async fn test_shutdown_recv_wakes_pending_waiters() {
        let signal = ShutdownSignal::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let receiver = signal.recv();
                tokio::spawn(receiver)
            })
            .collect();

        tokio::task::yield_now().await;
        for waiter in &waiters {
            assert!(!waiter.is_finished());
        }

        assert!(signal.trigger());
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter should wake")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_shutdown_recv_polled_in_select() {
        let signal = ShutdownSignal::new();
        let mut receiver = signal.recv();

        tokio::select! {
            biased;
            () = &mut receiver => panic!("should not complete before trigger"),
            () = tokio::task::yield_now() => {}
        }

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), receiver)
            .await
            .expect("recv should complete after trigger");
    }

    #[test]
    fn test_connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        let token1 = tracker.acquire();
        let token2 = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(token1);
        assert_eq!(tracker.active_connections(), 1);

        drop(token2);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_connection_tracker_wait_for_shutdown_immediate() {
        let tracker = ConnectionTracker::new();

        tokio::time::timeout(Duration::from_millis(10), tracker.wait_for_shutdown())
            .await
            .expect("wait_for_shutdown should complete immediately");
    }

    #[tokio::test]
    async fn test_connection_tracker_wait_for_shutdown_delayed() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();

        let tracker_clone = tracker.clone();
        let wait_handle = tokio::spawn(async move {
            tracker_clone.wait_for_shutdown().await;
        });

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(token);
        });

        tokio::time::timeout(Duration::from_secs(1), wait_handle)
            .await
            .expect("wait should complete")
            .expect("task should not panic");
    }

    #[test]
    fn test_coordinator_starts_running() {
        let coordinator = ShutdownCoordinator::default();
        assert_eq!(coordinator.state(), ShutdownState::Running);
        assert_eq!(coordinator.grace_period(), Duration::from_secs(10));
        assert!(coordinator.trigger_cause().is_none());
        assert!(coordinator.report().is_none());
    }

    #[test]
    fn test_request_shutdown_transitions_once() {
        let coordinator = ShutdownCoordinator::default();

        assert!(coordinator.request_shutdown());
        assert_eq!(coordinator.state(), ShutdownState::Draining);
        assert_eq!(coordinator.trigger_cause(), Some(ShutdownTrigger::Request));

        assert!(!coordinator.request_shutdown());
        assert_eq!(coordinator.state(), ShutdownState::Draining);
    }

    #[test]
    fn test_signal_after_request_is_ignored() {
        let coordinator = ShutdownCoordinator::default();
        assert!(coordinator.request_shutdown());
        assert!(!coordinator.trigger(ShutdownTrigger::Signal("SIGTERM")));
        assert_eq!(coordinator.trigger_cause(), Some(ShutdownTrigger::Request));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_have_one_winner() {
        let coordinator = ShutdownCoordinator::default();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let c = coordinator.clone();
                tokio::spawn(async move { c.request_shutdown() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(coordinator.state(), ShutdownState::Draining);
    }

    #[tokio::test]
    async fn test_drain_with_no_connections() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let tracker = ConnectionTracker::new();
        coordinator.request_shutdown();

        let outcome = coordinator.drain(&tracker).await;
        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(coordinator.state(), ShutdownState::Stopped);

        let report = coordinator.wait_stopped().await;
        assert_eq!(report.trigger, ShutdownTrigger::Request);
        assert_eq!(report.outcome, DrainOutcome::Drained);
    }

    #[tokio::test]
    async fn test_drain_waits_for_trigger() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let tracker = ConnectionTracker::new();

        let c = coordinator.clone();
        let t = tracker.clone();
        let drain = tokio::spawn(async move { c.drain(&t).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!drain.is_finished());
        assert_eq!(coordinator.state(), ShutdownState::Running);

        coordinator.request_shutdown();
        let outcome = tokio::time::timeout(Duration::from_secs(1), drain)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, DrainOutcome::Drained);
    }

    #[tokio::test]
    async fn test_drain_times_out_with_open_connection() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let tracker = ConnectionTracker::new();
        let _token = tracker.acquire();
        coordinator.request_shutdown();

        let outcome = coordinator.drain(&tracker).await;
        assert_eq!(outcome, DrainOutcome::TimedOut { remaining: 1 });
        assert!(outcome.is_timeout());
        assert_eq!(coordinator.state(), ShutdownState::Stopped);
    }

    #[tokio::test]
    async fn test_report_published_exactly_once() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let tracker = ConnectionTracker::new();
        coordinator.request_shutdown();

        let waiter1 = tokio::spawn({
            let c = coordinator.clone();
            async move { c.wait_stopped().await }
        });
        let waiter2 = tokio::spawn({
            let c = coordinator.clone();
            async move { c.wait_stopped().await }
        });

        let first = coordinator.drain(&tracker).await;

        let token = tracker.acquire();
        let second = coordinator.drain(&tracker).await;
        drop(token);
        assert!(second.is_timeout());

        let report1 = waiter1.await.unwrap();
        let report2 = waiter2.await.unwrap();
        assert_eq!(report1, report2);
        assert_eq!(report1.outcome, first);
        assert_eq!(coordinator.report(), Some(report1));
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        let mut rx = coordinator.subscribe();
        assert_eq!(*rx.borrow_and_update(), ShutdownState::Running);

        coordinator.request_shutdown();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ShutdownState::Draining);

        coordinator.drain(&ConnectionTracker::new()).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ShutdownState::Stopped);
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(
            ShutdownTrigger::Signal("SIGTERM").to_string(),
            "signal SIGTERM"
        );
        assert_eq!(ShutdownTrigger::Request.to_string(), "shutdown request");
    }
}
