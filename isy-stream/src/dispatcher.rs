//! Routing of parsed hub events to the registry and the host
//!
//! Routing order for one event:
//!
//! 1. `ERR` is ignored; the hub raises it for devices that still work.
//! 2. `_3`/`NE` is a communication error on a node.
//! 3. Other `_`-prefixed controls go through the control table.
//! 4. `RR` and `OL` (ramp rate, on level) are ignored.
//! 5. Everything else is a device status event, routed on the node's
//!    registry membership.

use std::sync::Arc;

use isy_api::CommandSender;
use isy_parser::{extract_new_name, Event, NodeAddress, ProgramStatus};
use isy_state::{decoders, DeviceHandle, DeviceRegistry, Membership};
use tracing::{debug, error, info, warn};

use crate::callbacks::HostCallbacks;
use crate::config::HubConfig;
use crate::control::{self, ControlCategory, NodeAction, TriggerAction};

/// What the connection loop must do after an event was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// A heartbeat arrived: answer it and re-arm the watchdog
    Heartbeat,
}

/// Applies hub events for one hub
pub struct Dispatcher {
    hub: Arc<HubConfig>,
    registry: Arc<DeviceRegistry>,
    host: Arc<dyn HostCallbacks>,
    commands: Arc<dyn CommandSender>,
}

impl Dispatcher {
    pub fn new(
        hub: Arc<HubConfig>,
        registry: Arc<DeviceRegistry>,
        host: Arc<dyn HostCallbacks>,
        commands: Arc<dyn CommandSender>,
    ) -> Self {
        Self {
            hub,
            registry,
            host,
            commands,
        }
    }

    pub fn hub(&self) -> &Arc<HubConfig> {
        &self.hub
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn host(&self) -> &Arc<dyn HostCallbacks> {
        &self.host
    }

    pub fn dispatch(&self, event: &Event) -> DispatchOutcome {
        let control = event.control.as_str();

        if control == "ERR" {
            debug!(
                node = %event.node,
                action = %event.action,
                event_info = %event.event_info,
                "IGNORED communications error"
            );
            return DispatchOutcome::Handled;
        }

        if control == "_3" && event.action == "NE" {
            self.communication_error(&NodeAddress::from(event.node.as_str()), &event.event_info);
            return DispatchOutcome::Handled;
        }

        if event.is_control_event() {
            return self.control_event(event);
        }

        if matches!(control, "RR" | "OL") {
            return DispatchOutcome::Handled;
        }

        self.status_event(event);
        DispatchOutcome::Handled
    }

    fn status_event(&self, event: &Event) {
        let address = NodeAddress::from(event.node.as_str());

        match self.registry.membership(&address) {
            Membership::Active(device) => {
                self.apply_status(&device, &event.control, &event.action);
            }
            _ if address.is_secondary() => {}
            Membership::Bad(device) if event.control == "ST" => {
                info!(node = %address, "device resumed communication");
                self.resume(&device);
            }
            Membership::Bad(_) => {
                debug!(node = %address, control = %event.control, "IGNORED event for bad device");
            }
            Membership::Unknown => {
                debug!(
                    node = %address,
                    control = %event.control,
                    action = %event.action,
                    event_info = %event.event_info,
                    "No device defined for node"
                );
                self.host.undefined_device_detected(&address);
            }
        }
    }

    fn apply_status(&self, device: &DeviceHandle, control: &str, action: &str) {
        match decoders::translate(&device.class, control, action) {
            Ok(updates) => {
                for update in &updates {
                    debug!(device = %device.name, %update, "state update");
                    self.host.update_state(device, update);
                }
            }
            Err(e) => {
                error!(device = %device.name, node = %device.address, error = %e, "failed to translate status event");
            }
        }
    }

    fn control_event(&self, event: &Event) -> DispatchOutcome {
        match control::classify(&event.control) {
            Some(ControlCategory::Heartbeat) => {
                debug!("heartbeat");
                return DispatchOutcome::Heartbeat;
            }
            Some(ControlCategory::Trigger) => self.trigger_event(event),
            Some(ControlCategory::NodeChanged) => self.node_event(event),
            Some(ControlCategory::EventViewer(label)) => {
                let text = control::event_viewer_message(
                    label,
                    &event.control,
                    &event.node,
                    &event.action,
                    &event.event_info,
                );
                self.host.event_viewer(&self.hub, &text);
            }
            Some(ControlCategory::Silent) => {}
            None => {
                error!(
                    control = %event.control,
                    action = %event.action,
                    event_info = %event.event_info,
                    "UNKNOWN control event"
                );
            }
        }
        DispatchOutcome::Handled
    }

    fn trigger_event(&self, event: &Event) {
        match TriggerAction::from_action(&event.action) {
            Some(TriggerAction::ProgramStatus) => {
                match ProgramStatus::from_event_info(&event.event_info) {
                    Ok(status) => {
                        let program_id = status.program_id(self.hub.id);
                        debug!(program = %program_id, fork = %status.fork, phase = %status.phase, "program status");
                        self.host.program_feedback(&program_id, status.fork, status.phase);
                    }
                    Err(e) => {
                        error!(error = %e, event_info = %event.event_info, "invalid program status");
                    }
                }
            }
            Some(TriggerAction::Info) => self.host.event_viewer(&self.hub, &event.event_info),
            Some(TriggerAction::Ignored) => {
                debug!(action = %event.action, event_info = %event.event_info, "IGNORED trigger event");
            }
            None => {
                error!(
                    node = %event.node,
                    action = %event.action,
                    event_info = %event.event_info,
                    "UNKNOWN _1 trigger event"
                );
            }
        }
    }

    fn node_event(&self, event: &Event) {
        let address = NodeAddress::from(event.node.as_str());

        match NodeAction::from_action(&event.action) {
            Some(NodeAction::CommError) => self.communication_error(&address, &event.event_info),
            Some(NodeAction::CommResumed) => {
                if let Membership::Bad(device) = self.registry.membership(&address) {
                    info!(node = %address, "communication error cleared");
                    self.resume(&device);
                }
            }
            Some(NodeAction::Removed) => {
                let was_bad = self.registry.is_bad(&address);
                if let Some(device) = self.registry.remove(&address) {
                    info!(node = %address, device = %device.name, "node removed");
                    self.host.device_needs_deletion(&device);
                    if was_bad {
                        self.report_bad_nodes();
                    }
                }
            }
            Some(NodeAction::Added) => {
                if let Some(device) = self.host.device_needs_adding(&self.hub, &event.event_info) {
                    info!(node = %device.address, device = %device.name, "node added");
                    let query_address = device.address.clone();
                    self.registry.insert(device);
                    self.query(&query_address);
                }
            }
            Some(NodeAction::Renamed) => match extract_new_name(&event.event_info) {
                Some(name) => {
                    if let Some(device) = self.registry.rename(&address, name) {
                        info!(node = %address, name = %device.name, "node renamed");
                        self.host.rename_device(&device);
                    }
                }
                None => {
                    warn!(node = %address, event_info = %event.event_info, "rename event without a new name");
                }
            },
            Some(NodeAction::Ignored) => {
                debug!(node = %address, action = %event.action, "IGNORED node change");
            }
            None => {
                error!(
                    node = %address,
                    action = %event.action,
                    event_info = %event.event_info,
                    "unhandled _3 node event"
                );
            }
        }
    }

    fn communication_error(&self, address: &NodeAddress, event_info: &str) {
        debug!(node = %address, event_info = %event_info, "Communication Error");

        let Some(device) = self.registry.get_active(address) else {
            return;
        };

        let needs_deletion = self.host.communication_error(&self.hub, &device);
        if needs_deletion {
            self.registry.remove_active(address);
        } else {
            self.registry.mark_bad(address);
            self.host.set_enabled(&device, false);
        }
        warn!(node = %address, device = %device.name, deleted = needs_deletion, "device communication error");
        self.report_bad_nodes();
    }

    fn resume(&self, device: &DeviceHandle) {
        if self.registry.mark_resumed(&device.address).is_none() {
            return;
        }
        self.host.set_enabled(device, true);
        self.host.communication_resumed(&self.hub, device);
        self.report_bad_nodes();
        self.query(&device.address);
    }

    fn query(&self, address: &NodeAddress) {
        if let Err(e) = self.commands.query_device(address) {
            warn!(node = %address, error = %e, "status query failed");
        }
    }

    fn report_bad_nodes(&self) {
        self.host
            .bad_nodes_changed(&self.hub, &self.registry.bad_addresses());
    }
}
