//! # isy-stream
//!
//! Event subscription for ISY hubs: one worker thread per hub keeps a
//! subscription socket open, answers heartbeats, reconnects on failure and
//! routes every event to the device registry and the host.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use isy_api::{ClientConfig, IsyClient};
//! use isy_state::DeviceRegistry;
//! use isy_stream::{HubConfig, HubRegistry, StreamConfig};
//! use soap_client::Credentials;
//!
//! let credentials = Credentials::new("admin", "admin");
//! let commands = Arc::new(IsyClient::new("192.168.1.20", credentials.clone(), ClientConfig::default())?);
//! let hubs = HubRegistry::new(StreamConfig::default());
//!
//! hubs.start(
//!     HubConfig::new(1, "uuid:00:21:b9:01:02:03", "192.168.1.20", credentials),
//!     Arc::new(DeviceRegistry::new()),
//!     host, // your HostCallbacks implementation
//!     commands,
//! )?;
//!
//! hubs.stop_all()?;
//! ```

pub mod callbacks;
pub mod clock;
pub mod config;
pub mod control;
pub mod dispatcher;
pub mod error;
pub mod hubs;
pub mod sequence;
pub mod subscriber;
pub mod transport;
pub mod triggers;
pub mod watchdog;

pub use callbacks::{ConnectionStatus, HostCallbacks};
pub use clock::{Clock, SystemClock};
pub use config::{HubConfig, StreamConfig};
pub use control::{ControlCategory, NodeAction, TriggerAction};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{Result, StreamError};
pub use hubs::HubRegistry;
pub use sequence::{SequenceCheck, SequenceTracker};
pub use subscriber::{ConnectionPhase, SessionEnd, SessionStatus, Subscriber, SubscriberHandle, HEARTBEAT_REPLY};
pub use transport::{Connection, Connector, TcpConnector};
pub use triggers::{ProgramTriggers, TriggerKind};
pub use watchdog::HeartbeatWatchdog;
