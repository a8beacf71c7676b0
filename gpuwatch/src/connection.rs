//! Connection manager: owns the single agent connection and turns its frames
//! into snapshot/window updates and subscriber notifications.
//!
//! State machine: `Disconnected -> Connecting -> Connected -> Closed`. A lost
//! connection drops back to `Disconnected` (reconnectable); `close()` is
//! terminal. The transport lives in an `Option` and is released by `take()`,
//! so it is dropped exactly once no matter which path tears it down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConnectionError, ParseError};
use crate::events::{CloseReason, ConnState, Event, SubscriptionId, Subscribers};
use crate::history::{SlidingWindow, DEFAULT_CAPACITY};
use crate::normalize::sample_from_payload;
use crate::reconnect::{Backoff, ReconnectPolicy};
use crate::snapshot::SnapshotState;
use crate::types::Sample;

/// Receive side of an established connection. Dropping it releases the
/// underlying resource.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Next payload; `None` once the peer has closed the stream.
    async fn recv(&mut self) -> Option<Result<Vec<u8>, ConnectionError>>;

    /// Best-effort close handshake before the transport is dropped.
    async fn close_gracefully(&mut self) {}
}

#[allow(async_fn_in_trait)]
pub trait Dialer {
    type Conn: Transport;

    async fn dial(&mut self, endpoint: &Url) -> Result<Self::Conn, ConnectionError>;
}

/// What to do with the window and snapshot when a new session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Start every session from an empty window.
    #[default]
    Reset,
    /// Keep points from earlier sessions.
    Retain,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub window_capacity: usize,
    pub history: HistoryPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_CAPACITY,
            history: HistoryPolicy::Reset,
        }
    }
}

/// Requests teardown from outside the frame handler. Once fired, no further
/// frame mutates the snapshot or the window, and any pending receive or
/// reconnect wait is woken.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    inner: Arc<Liveness>,
}

#[derive(Debug)]
struct Liveness {
    alive: AtomicBool,
    wake: Notify,
}

impl CloseHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(Liveness {
                alive: AtomicBool::new(true),
                wake: Notify::new(),
            }),
        }
    }

    pub fn close(&self) {
        self.inner.alive.store(false, Ordering::Release);
        self.inner.wake.notify_waiters();
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::Acquire)
    }

    /// Resolves once `close` has been called, immediately if it already was.
    pub async fn closed(&self) {
        let notified = self.inner.wake.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent close is not missed.
        notified.as_mut().enable();
        if !self.is_alive() {
            return;
        }
        notified.await;
    }
}

/// Outcome of processing one inbound event.
#[derive(Debug)]
pub enum Step {
    /// A valid frame was applied and subscribers were notified.
    Applied(Sample),
    /// The frame was malformed and dropped; the session continues.
    Rejected(ParseError),
    /// The frame arrived after teardown began and was ignored.
    Discarded,
    /// The session is over. `Some` carries the transport error, if any.
    Ended(Option<ConnectionError>),
}

pub struct ConnectionManager<D: Dialer> {
    dialer: D,
    conn: Option<D::Conn>,
    state: ConnState,
    endpoint: Option<Url>,
    liveness: CloseHandle,
    options: SessionOptions,
    snapshot: SnapshotState,
    window: SlidingWindow,
    subscribers: Subscribers,
    applied: u64,
    rejected: u64,
}

impl<D: Dialer> ConnectionManager<D> {
    pub fn new(dialer: D, options: SessionOptions) -> Self {
        Self {
            dialer,
            conn: None,
            state: ConnState::Disconnected,
            endpoint: None,
            liveness: CloseHandle::new(),
            window: SlidingWindow::new(options.window_capacity),
            options,
            snapshot: SnapshotState::new(),
            subscribers: Subscribers::new(),
            applied: 0,
            rejected: 0,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnState::Connected
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn snapshot(&self) -> &Sample {
        self.snapshot.get()
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn applied_frames(&self) -> u64 {
        self.applied
    }

    pub fn rejected_frames(&self) -> u64 {
        self.rejected
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.liveness.clone()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn set_state(&mut self, state: ConnState) {
        if self.state != state {
            self.state = state;
            self.subscribers.emit(&Event::Status(state));
        }
    }

    pub async fn open(&mut self, endpoint: &Url) -> Result<(), ConnectionError> {
        match self.state {
            ConnState::Closed => return Err(ConnectionError::Closed),
            ConnState::Connecting | ConnState::Connected => {
                return Err(ConnectionError::AlreadyOpen)
            }
            ConnState::Disconnected => {}
        }
        if !self.liveness.is_alive() {
            self.close();
            return Err(ConnectionError::Closed);
        }

        self.endpoint = Some(endpoint.clone());
        self.set_state(ConnState::Connecting);
        info!(%endpoint, "connecting");
        match self.dialer.dial(endpoint).await {
            Ok(conn) => {
                if !self.liveness.is_alive() {
                    // Teardown raced the handshake; release what we just got.
                    drop(conn);
                    self.close();
                    return Err(ConnectionError::Closed);
                }
                self.conn = Some(conn);
                if self.options.history == HistoryPolicy::Reset {
                    self.window.clear();
                    self.snapshot.reset();
                }
                self.set_state(ConnState::Connected);
                info!(%endpoint, "connected");
                Ok(())
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "connect failed");
                self.set_state(ConnState::Disconnected);
                self.subscribers
                    .emit(&Event::Closed(CloseReason::Failed(e.to_string())));
                Err(e)
            }
        }
    }

    /// Handle one inbound payload. Malformed input is reported, never fatal.
    /// Returns `Ok(None)` when teardown has begun and the frame was ignored.
    pub fn on_frame(&mut self, raw: &[u8]) -> Result<Option<Sample>, ParseError> {
        let sample = match sample_from_payload(raw) {
            Ok(s) => s,
            Err(e) => {
                self.rejected += 1;
                warn!(error = %e, rejected = self.rejected, "dropping malformed frame");
                return Err(e);
            }
        };
        if !self.liveness.is_alive() || self.state != ConnState::Connected {
            debug!("frame arrived after teardown; ignoring");
            return Ok(None);
        }
        self.snapshot.update(sample.clone());
        self.window.push(sample.to_point());
        self.applied += 1;
        debug!(
            device = %sample.name,
            util = sample.utilization_pct,
            mem_gib = sample.memory_used_gib,
            temp_c = sample.temperature_c,
            "sample"
        );
        self.subscribers.emit(&Event::Sample(sample.clone()));
        Ok(Some(sample))
    }

    /// Wait for the next frame and process it.
    pub async fn step(&mut self) -> Step {
        if !self.liveness.is_alive() {
            self.close();
            return Step::Ended(None);
        }
        let liveness = self.liveness.clone();
        let Some(conn) = self.conn.as_mut() else {
            return Step::Ended(None);
        };
        let next = tokio::select! {
            biased;
            _ = liveness.closed() => None,
            item = conn.recv() => Some(item),
        };
        let Some(item) = next else {
            self.close();
            return Step::Ended(None);
        };
        match item {
            Some(Ok(payload)) => match self.on_frame(&payload) {
                Ok(Some(sample)) => Step::Applied(sample),
                Ok(None) => Step::Discarded,
                Err(e) => Step::Rejected(e),
            },
            None => {
                self.disconnect(CloseReason::PeerClosed);
                Step::Ended(None)
            }
            Some(Err(e)) => {
                self.disconnect(CloseReason::Lost(e.to_string()));
                Step::Ended(Some(e))
            }
        }
    }

    /// Process frames until the session ends.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        loop {
            if let Step::Ended(err) = self.step().await {
                return err.map_or(Ok(()), Err);
            }
        }
    }

    /// `open` + `run`, reconnecting with backoff until `close` is requested or
    /// the retry budget is spent.
    pub async fn run_supervised(
        &mut self,
        endpoint: &Url,
        policy: &ReconnectPolicy,
    ) -> Result<(), ConnectionError> {
        let mut backoff = Backoff::new(policy.clone());
        loop {
            match self.open(endpoint).await {
                Ok(()) => {
                    backoff.reset();
                    if let Err(e) = self.run().await {
                        warn!(error = %e, "session ended with error");
                    }
                }
                Err(ConnectionError::Closed) => return Ok(()),
                Err(_) => {}
            }
            if self.state == ConnState::Closed || !self.liveness.is_alive() {
                self.close();
                return Ok(());
            }
            match backoff.next_delay() {
                Some(delay) => {
                    info!(
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "reconnecting"
                    );
                    let liveness = self.liveness.clone();
                    tokio::select! {
                        _ = liveness.closed() => {
                            self.close();
                            return Ok(());
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    let attempts = backoff.attempts().saturating_sub(1);
                    return Err(ConnectionError::RetriesExhausted { attempts });
                }
            }
        }
    }

    fn disconnect(&mut self, reason: CloseReason) {
        if let Some(conn) = self.conn.take() {
            drop(conn);
            warn!(%reason, "disconnected");
            self.set_state(ConnState::Disconnected);
            self.subscribers.emit(&Event::Closed(reason));
        }
    }

    /// Release the connection and stop. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        self.liveness.close();
        if self.state == ConnState::Closed {
            return;
        }
        let had_conn = self.conn.take().is_some();
        self.set_state(ConnState::Closed);
        if had_conn {
            info!("connection closed");
            self.subscribers.emit(&Event::Closed(CloseReason::Requested));
        }
    }

    /// `close`, after attempting a polite close handshake with the agent.
    pub async fn shutdown(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            conn.close_gracefully().await;
        }
        self.close();
    }
}

impl<D: Dialer> Drop for ConnectionManager<D> {
    fn drop(&mut self) {
        self.close();
    }
}
