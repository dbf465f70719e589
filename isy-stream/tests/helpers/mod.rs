//! Shared fixtures for isy-stream integration tests: a scripted in-memory
//! connector, a manual clock and a host that records every callback.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use isy_api::CommandSender;
use isy_parser::{Event, Fork, NodeAddress, Phase};
use isy_state::{DeviceClass, DeviceHandle, DeviceRegistry, StateUpdate};
use isy_stream::{
    Clock, Connection, ConnectionStatus, Connector, Dispatcher, HostCallbacks, HubConfig,
    StreamConfig, Subscriber,
};
use parking_lot::Mutex;
use soap_client::Credentials;

pub const SID: &str = "uuid:74";
pub const HUB_ID: u32 = 7;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Clock that only moves when told to; `sleep` advances it and is recorded
pub struct ManualClock {
    now: Mutex<Instant>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// One read result of a scripted stream
#[derive(Debug, Clone)]
pub enum Step {
    /// Bytes delivered by the next read
    Data(Vec<u8>),
    /// A read timeout after the clock advanced by the given amount
    Timeout(Duration),
    /// Bytes delivered after the clock advanced by the given amount
    Slow(Duration, Vec<u8>),
    /// Read timeouts forever, each after a real 1ms pause
    Idle,
}

/// What the next `connect` call does
pub enum Script {
    Refuse,
    Stream(Vec<Step>),
}

pub struct ScriptedStream {
    steps: VecDeque<Step>,
    clock: Arc<ManualClock>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(Step::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
            Some(Step::Slow(advance, bytes)) => {
                self.clock.advance(advance);
                self.steps.push_front(Step::Data(bytes));
                self.read(buf)
            }
            Some(Step::Timeout(advance)) => {
                self.clock.advance(advance);
                Err(io::Error::new(io::ErrorKind::WouldBlock, "scripted timeout"))
            }
            Some(Step::Idle) => {
                self.steps.push_front(Step::Idle);
                std::thread::sleep(Duration::from_millis(1));
                Err(io::Error::new(io::ErrorKind::TimedOut, "idle"))
            }
            None => Ok(0),
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Connector that plays back scripts in order. When the scripts run out it
/// sets the subscriber's stop flag and refuses, which ends `Subscriber::run`.
pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    clock: Arc<ManualClock>,
    stop: Mutex<Option<Arc<AtomicBool>>>,
    written: Mutex<Vec<Arc<Mutex<Vec<u8>>>>>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(clock: Arc<ManualClock>, scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            clock,
            stop: Mutex::new(None),
            written: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn set_stop_flag(&self, flag: Arc<AtomicBool>) {
        *self.stop.lock() = Some(flag);
    }

    /// Number of `connect` calls so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Everything written on the `index`-th successful connection
    pub fn written(&self, index: usize) -> String {
        let buffers = self.written.lock();
        let bytes = buffers[index].lock().clone();
        String::from_utf8(bytes).unwrap()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, _address: &str, _port: u16, _timeout: Duration) -> io::Result<Box<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.scripts.lock().pop_front() {
            Some(Script::Stream(steps)) => {
                let written = Arc::new(Mutex::new(Vec::new()));
                self.written.lock().push(Arc::clone(&written));
                Ok(Box::new(ScriptedStream {
                    steps: steps.into(),
                    clock: Arc::clone(&self.clock),
                    written,
                }))
            }
            Some(Script::Refuse) => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
            None => {
                if let Some(flag) = self.stop.lock().as_ref() {
                    flag.store(true, Ordering::SeqCst);
                }
                Err(io::Error::new(io::ErrorKind::ConnectionRefused, "script exhausted"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host and command recorders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Update(NodeAddress, StateUpdate),
    Renamed(NodeAddress, String),
    Enabled(NodeAddress, bool),
    Status(ConnectionStatus),
    CommError(NodeAddress),
    Resumed(NodeAddress),
    Deleted(NodeAddress),
    Adding(String),
    Undefined(NodeAddress),
    Program(String, Fork, Phase),
    EventViewer(String),
    BadNodes(Vec<NodeAddress>),
}

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    delete_on_error: AtomicBool,
    adding: Mutex<Option<DeviceHandle>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(NodeAddress, StateUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Update(address, update) => Some((address, update)),
                _ => None,
            })
            .collect()
    }

    pub fn delete_on_error(&self, delete: bool) {
        self.delete_on_error.store(delete, Ordering::SeqCst);
    }

    pub fn answer_adding_with(&self, device: DeviceHandle) {
        *self.adding.lock() = Some(device);
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

impl HostCallbacks for RecordingHost {
    fn update_state(&self, device: &DeviceHandle, update: &StateUpdate) {
        self.record(HostCall::Update(device.address.clone(), update.clone()));
    }

    fn rename_device(&self, device: &DeviceHandle) {
        self.record(HostCall::Renamed(device.address.clone(), device.name.clone()));
    }

    fn set_enabled(&self, device: &DeviceHandle, enabled: bool) {
        self.record(HostCall::Enabled(device.address.clone(), enabled));
    }

    fn set_connection_status(&self, _hub: &HubConfig, status: ConnectionStatus) {
        self.record(HostCall::Status(status));
    }

    fn communication_error(&self, _hub: &HubConfig, device: &DeviceHandle) -> bool {
        self.record(HostCall::CommError(device.address.clone()));
        self.delete_on_error.load(Ordering::SeqCst)
    }

    fn communication_resumed(&self, _hub: &HubConfig, device: &DeviceHandle) {
        self.record(HostCall::Resumed(device.address.clone()));
    }

    fn device_needs_deletion(&self, device: &DeviceHandle) {
        self.record(HostCall::Deleted(device.address.clone()));
    }

    fn device_needs_adding(&self, _hub: &HubConfig, node_xml: &str) -> Option<DeviceHandle> {
        self.record(HostCall::Adding(node_xml.to_string()));
        self.adding.lock().take()
    }

    fn undefined_device_detected(&self, address: &NodeAddress) {
        self.record(HostCall::Undefined(address.clone()));
    }

    fn program_feedback(&self, program_id: &str, fork: Fork, phase: Phase) {
        self.record(HostCall::Program(program_id.to_string(), fork, phase));
    }

    fn event_viewer(&self, _hub: &HubConfig, text: &str) {
        self.record(HostCall::EventViewer(text.to_string()));
    }

    fn bad_nodes_changed(&self, _hub: &HubConfig, bad: &[NodeAddress]) {
        self.record(HostCall::BadNodes(bad.to_vec()));
    }
}

#[derive(Default)]
pub struct RecordingCommands {
    queried: Mutex<Vec<NodeAddress>>,
}

impl RecordingCommands {
    pub fn queried(&self) -> Vec<NodeAddress> {
        self.queried.lock().clone()
    }
}

impl CommandSender for RecordingCommands {
    fn query_device(&self, address: &NodeAddress) -> isy_api::Result<()> {
        self.queried.lock().push(address.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub hub: Arc<HubConfig>,
    pub registry: Arc<DeviceRegistry>,
    pub host: Arc<RecordingHost>,
    pub commands: Arc<RecordingCommands>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            hub: Arc::new(
                HubConfig::new(HUB_ID, "uuid:hub", "192.168.1.20", Credentials::new("admin", "admin"))
                    .with_name("Test Hub"),
            ),
            registry: Arc::new(DeviceRegistry::new()),
            host: Arc::new(RecordingHost::new()),
            commands: Arc::new(RecordingCommands::default()),
            clock: Arc::new(ManualClock::new()),
        }
    }

    pub fn with_device(self, id: u64, address: &str, class: DeviceClass) -> Self {
        self.registry
            .insert(DeviceHandle::new(id, address, format!("Device {}", id), class));
        self
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.hub),
            Arc::clone(&self.registry),
            self.host.clone(),
            self.commands.clone(),
        )
    }

    pub fn connector(&self, scripts: Vec<Script>) -> Arc<ScriptedConnector> {
        Arc::new(ScriptedConnector::new(Arc::clone(&self.clock), scripts))
    }

    pub fn subscriber(&self, connector: &Arc<ScriptedConnector>) -> Subscriber {
        let subscriber = Subscriber::new(
            StreamConfig::default(),
            self.dispatcher(),
            connector.clone(),
            self.clock.clone(),
        );
        connector.set_stop_flag(subscriber.stop_flag());
        subscriber
    }
}

// ---------------------------------------------------------------------------
// Wire fixtures
// ---------------------------------------------------------------------------

/// Pseudo-HTTP frame as the hub pushes it on the subscription socket
pub fn frame(body: &str) -> Vec<u8> {
    format!(
        "POST /reuse HTTP/1.1\r\nCONTENT-LENGTH: {}\r\nCONTENT-TYPE: text/xml\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

fn response(status_line: &str, body: &str) -> Vec<u8> {
    format!("{}\r\nContent-Length: {}\r\n\r\n{}", status_line, body.len(), body).into_bytes()
}

pub fn subscribe_ok(sid: &str) -> Step {
    Step::Data(response(
        "HTTP/1.1 200 OK",
        &format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><s:Envelope><s:Body><SubscriptionResponse><SID>{}</SID><duration>0</duration></SubscriptionResponse></s:Body></s:Envelope>",
            sid
        ),
    ))
}

pub fn subscribe_rejected() -> Step {
    Step::Data(response(
        "HTTP/1.1 401 Unauthorized",
        "<s:Envelope><s:Body><UDIDefaultResponse><status>401</status></UDIDefaultResponse></s:Body></s:Envelope>",
    ))
}

pub fn unsubscribe_ok() -> Step {
    Step::Data(response("HTTP/1.1 200 OK", ""))
}

pub fn event_xml(sid: &str, seqnum: u64, control: &str, action: &str, node: &str, info: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><Event seqnum=\"{}\" sid=\"{}\"><control>{}</control><action>{}</action><node>{}</node><eventInfo>{}</eventInfo></Event>",
        seqnum, sid, control, action, node, info
    )
}

pub fn event_step(sid: &str, seqnum: u64, control: &str, action: &str, node: &str) -> Step {
    Step::Data(frame(&event_xml(sid, seqnum, control, action, node, "")))
}

pub fn heartbeat(seqnum: u64) -> Step {
    event_step(SID, seqnum, "_0", "120", "")
}

/// In-memory event for driving a dispatcher directly
pub fn event(control: &str, action: &str, node: &str, event_info: &str) -> Event {
    Event {
        sid: SID.to_string(),
        seqnum: 1,
        control: control.to_string(),
        action: action.to_string(),
        node: node.to_string(),
        event_info: event_info.to_string(),
    }
}

pub fn addr(address: &str) -> NodeAddress {
    NodeAddress::from(address)
}
