//! Long-running subscription worker for one hub
//!
//! The worker is a small state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Subscribing -> Active -> Disconnected -> ...
//! ```
//!
//! It loops until its stop flag is set. Failed connects and rejected
//! handshakes wait `retry_delay` before the next attempt; a connection lost
//! while active reconnects immediately. The stop flag and the heartbeat
//! watchdog are checked after every read, and reads on the socket time out
//! every `io_timeout`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use isy_parser::{Event, ParseError};
use parking_lot::Mutex;
use soap_client::{FrameReader, SoapError};
use tracing::{debug, error, info, info_span, warn};

use crate::callbacks::ConnectionStatus;
use crate::clock::Clock;
use crate::config::{HubConfig, StreamConfig};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::{Result, StreamError};
use crate::sequence::{SequenceCheck, SequenceTracker};
use crate::transport::{Connection, Connector};
use crate::watchdog::HeartbeatWatchdog;

/// Literal reply to a heartbeat event
pub const HEARTBEAT_REPLY: &[u8] = b"beat";

const BACKOFF_SLICE: Duration = Duration::from_secs(1);
const JOIN_POLL: Duration = Duration::from_millis(20);

/// Where the worker currently is in its connection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Subscribing,
    Active,
}

/// Snapshot of a worker's connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: ConnectionPhase,
    /// Subscription id of the current or most recent subscription
    pub sid: Option<String>,
    /// Sequence number of the last accepted event
    pub last_seqnum: u64,
    /// Heartbeat deadline while active
    pub heartbeat_deadline: Option<Instant>,
    /// Number of connection attempts so far
    pub connect_attempts: u64,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            phase: ConnectionPhase::Disconnected,
            sid: None,
            last_seqnum: 0,
            heartbeat_deadline: None,
            connect_attempts: 0,
        }
    }
}

/// Why one connect/subscribe/receive cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ConnectFailed,
    HandshakeFailed,
    ConnectionLost,
    HeartbeatLost,
    Stopped,
}

/// Subscription worker for one hub
pub struct Subscriber {
    hub: Arc<HubConfig>,
    config: StreamConfig,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    dispatcher: Dispatcher,
    stop: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    sequence: SequenceTracker,
    watchdog: HeartbeatWatchdog,
}

impl Subscriber {
    pub fn new(
        config: StreamConfig,
        dispatcher: Dispatcher,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hub: Arc::clone(dispatcher.hub()),
            watchdog: HeartbeatWatchdog::new(config.heartbeat_timeout),
            config,
            connector,
            clock,
            dispatcher,
            stop: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(SessionStatus::default())),
            sequence: SequenceTracker::new(),
        }
    }

    /// Flag that ends the worker loop once set
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn status(&self) -> SessionStatus {
        self.status.lock().clone()
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.status.lock().phase = phase;
    }

    /// Run until the stop flag is set
    pub fn run(mut self) {
        info!(address = %self.hub.address, "subscriber started");

        while !self.stopping() {
            match self.run_session() {
                SessionEnd::ConnectFailed | SessionEnd::HandshakeFailed => self.backoff(),
                SessionEnd::ConnectionLost | SessionEnd::HeartbeatLost => {
                    info!("reconnecting");
                }
                SessionEnd::Stopped => break,
            }
        }

        info!("subscriber stopped");
    }

    /// One connect, subscribe and receive cycle
    pub fn run_session(&mut self) -> SessionEnd {
        {
            let mut status = self.status.lock();
            status.phase = ConnectionPhase::Connecting;
            status.connect_attempts += 1;
        }

        let stream = match self.connector.connect(
            &self.hub.address,
            self.config.port,
            self.config.io_timeout,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(address = %self.hub.address, port = self.config.port, error = %e, "connect failed");
                self.set_phase(ConnectionPhase::Disconnected);
                return SessionEnd::ConnectFailed;
            }
        };

        let mut reader = FrameReader::new(stream);
        self.set_phase(ConnectionPhase::Subscribing);

        let sid = match soap_client::subscribe(&mut reader, &self.hub.address, &self.hub.credentials) {
            Ok(sid) => sid,
            Err(e) => {
                error!(error = %e, "subscription failed");
                self.set_phase(ConnectionPhase::Disconnected);
                return SessionEnd::HandshakeFailed;
            }
        };
        info!(sid = %sid, "subscribed");

        self.sequence.reset();
        self.watchdog.arm(self.clock.now());
        {
            let mut status = self.status.lock();
            status.phase = ConnectionPhase::Active;
            status.sid = Some(sid.clone());
            status.last_seqnum = 0;
            status.heartbeat_deadline = self.watchdog.deadline();
        }
        self.dispatcher
            .host()
            .set_connection_status(&self.hub, ConnectionStatus::Connected);

        let end = self.receive_loop(&mut reader, &sid);

        self.watchdog.disarm();
        drop(reader);
        {
            let mut status = self.status.lock();
            status.phase = ConnectionPhase::Disconnected;
            status.heartbeat_deadline = None;
        }
        self.dispatcher
            .host()
            .set_connection_status(&self.hub, ConnectionStatus::Disconnected);

        end
    }

    fn receive_loop(&mut self, reader: &mut FrameReader<Box<dyn Connection>>, sid: &str) -> SessionEnd {
        loop {
            if self.stopping() {
                return SessionEnd::Stopped;
            }
            if self.watchdog.expired(self.clock.now()) {
                error!(timeout = ?self.config.heartbeat_timeout, "heartbeat lost, connection presumed dead");
                return SessionEnd::HeartbeatLost;
            }

            let message = match reader.poll_message() {
                Ok(Some(message)) => message,
                Ok(None) => continue,
                Err(e) if e.is_timeout() => continue,
                Err(e) => {
                    if self.stopping() {
                        return SessionEnd::Stopped;
                    }
                    error!(error = %e, "connection lost");
                    return SessionEnd::ConnectionLost;
                }
            };

            if let Some(DispatchOutcome::Heartbeat) = self.handle_body(&message.body, sid) {
                if let Err(e) = reply_to_heartbeat(reader) {
                    error!(error = %e, "failed to answer heartbeat");
                    return SessionEnd::ConnectionLost;
                }
                self.watchdog.arm(self.clock.now());
                self.status.lock().heartbeat_deadline = self.watchdog.deadline();
            }
        }
    }

    fn handle_body(&mut self, body: &str, sid: &str) -> Option<DispatchOutcome> {
        let event = match Event::from_xml(body) {
            Ok(event) => event,
            Err(ParseError::MissingEvent) => {
                warn!(body = %body, "invalid request body");
                return None;
            }
            Err(e) => {
                error!(error = %e, body = %body, "malformed event");
                return None;
            }
        };

        if event.sid != sid {
            error!(expected = %sid, received = %event.sid, "event for another subscription discarded");
            return None;
        }

        match self.sequence.observe(event.seqnum) {
            SequenceCheck::InOrder => {}
            SequenceCheck::Gap { first, last } => {
                warn!("Missing Sequence Numbers {}-{}", first, last);
            }
            SequenceCheck::NonMonotonic { previous } => {
                warn!(previous, received = event.seqnum, "sequence number went backwards");
            }
        }
        self.status.lock().last_seqnum = event.seqnum;

        debug!(
            seqnum = event.seqnum,
            control = %event.control,
            action = %event.action,
            node = %event.node,
            "event"
        );
        Some(self.dispatcher.dispatch(&event))
    }

    fn backoff(&self) {
        let mut remaining = self.config.retry_delay;
        while !remaining.is_zero() && !self.stopping() {
            let slice = remaining.min(BACKOFF_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
    }

    /// Start the worker on its own thread
    pub fn spawn(self) -> Result<SubscriberHandle> {
        let hub = Arc::clone(&self.hub);
        let config = self.config.clone();
        let connector = Arc::clone(&self.connector);
        let stop = Arc::clone(&self.stop);
        let status = Arc::clone(&self.status);
        let span = info_span!("isy_subscriber", hub = %hub.name);

        let thread = thread::Builder::new()
            .name(format!("isy-subscriber-{}", hub.id))
            .spawn(move || span.in_scope(|| self.run()))
            .map_err(StreamError::Spawn)?;

        Ok(SubscriberHandle {
            hub,
            config,
            connector,
            stop,
            status,
            thread: Some(thread),
        })
    }
}

fn reply_to_heartbeat<S: Write>(reader: &mut FrameReader<S>) -> std::io::Result<()> {
    let stream = reader.get_mut();
    stream.write_all(HEARTBEAT_REPLY)?;
    stream.flush()
}

/// Owner's side of a running subscriber
pub struct SubscriberHandle {
    hub: Arc<HubConfig>,
    config: StreamConfig,
    connector: Arc<dyn Connector>,
    stop: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    thread: Option<JoinHandle<()>>,
}

impl SubscriberHandle {
    pub fn hub(&self) -> &HubConfig {
        &self.hub
    }

    pub fn status(&self) -> SessionStatus {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Sets the stop flag, unsubscribes on a fresh connection, then waits up
    /// to `shutdown_grace` for the worker, which may be blocked in a read.
    pub fn stop(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        self.unsubscribe();

        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let deadline = Instant::now() + self.config.shutdown_grace;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                warn!(hub = %self.hub.name, "subscriber did not stop in time");
                self.thread = Some(thread);
                return Err(StreamError::ShutdownTimeout(self.config.shutdown_grace));
            }
            thread::sleep(JOIN_POLL);
        }

        thread.join().map_err(|_| StreamError::WorkerPanicked)
    }

    fn unsubscribe(&self) {
        let Some(sid) = self.status.lock().sid.clone() else {
            return;
        };

        let result = self
            .connector
            .connect(&self.hub.address, self.config.port, self.config.unsubscribe_timeout)
            .map_err(SoapError::from)
            .and_then(|stream| {
                let mut reader = FrameReader::new(stream);
                soap_client::unsubscribe(&mut reader, &self.hub.address, &self.hub.credentials, &sid)
            });

        match result {
            Ok(status) => info!(hub = %self.hub.name, sid = %sid, status, "unsubscribed"),
            Err(e) => warn!(hub = %self.hub.name, sid = %sid, error = %e, "unsubscribe failed"),
        }
    }
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}
