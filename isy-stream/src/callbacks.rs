//! Interface to the host automation platform
//!
//! The dispatcher never touches host device records directly. Everything it
//! learns from the hub is reported through [`HostCallbacks`], which the host
//! implements over its own device database.

use std::fmt;

use isy_parser::{Fork, NodeAddress, Phase};
use isy_state::{DeviceHandle, StateUpdate};

use crate::config::HubConfig;

/// Connection status reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callbacks from a hub subscriber into the host.
///
/// Called from the subscriber's worker thread; implementations must not
/// block for long since events queue up on the socket meanwhile.
pub trait HostCallbacks: Send + Sync {
    /// Write one state value to a device
    fn update_state(&self, device: &DeviceHandle, update: &StateUpdate);

    /// Persist a device whose name changed on the hub
    fn rename_device(&self, _device: &DeviceHandle) {}

    /// Enable or disable a device's host record
    fn set_enabled(&self, _device: &DeviceHandle, _enabled: bool) {}

    fn set_connection_status(&self, hub: &HubConfig, status: ConnectionStatus);

    /// A device stopped responding. Return `true` if the host wants the
    /// device deleted rather than parked in the bad set.
    fn communication_error(&self, hub: &HubConfig, device: &DeviceHandle) -> bool;

    fn communication_resumed(&self, hub: &HubConfig, device: &DeviceHandle);

    /// The hub removed a node
    fn device_needs_deletion(&self, device: &DeviceHandle);

    /// The hub added a node; `node_xml` is the raw node definition. Return the
    /// new device handle, or `None` if the host does not mirror this node.
    fn device_needs_adding(&self, hub: &HubConfig, node_xml: &str) -> Option<DeviceHandle>;

    /// A status event arrived for a node with no host device
    fn undefined_device_detected(&self, address: &NodeAddress);

    /// A program branch started or finished
    fn program_feedback(&self, program_id: &str, fork: Fork, phase: Phase);

    /// Informational text for the host's event log
    fn event_viewer(&self, hub: &HubConfig, text: &str);

    /// The set of bad nodes changed
    fn bad_nodes_changed(&self, _hub: &HubConfig, _bad: &[NodeAddress]) {}
}
