//! Device handles and the state values translators produce

use std::fmt;

use isy_parser::NodeAddress;
use serde::{Deserialize, Serialize};

/// Host-side identifier of a device record
pub type DeviceId = u64;

/// Kind of device, which decides how its status events are translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Relay,
    Irrigation,
    IoDevice,
    /// Dimmable load; `max_brightness` is the raw level the hub reports at
    /// full brightness (255 for Insteon/X10, 100 for Z-Wave)
    Dimmer { max_brightness: u32 },
    Thermostat,
}

impl DeviceClass {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceClass::Relay => "relay",
            DeviceClass::Irrigation => "irrigation",
            DeviceClass::IoDevice => "io device",
            DeviceClass::Dimmer { .. } => "dimmer",
            DeviceClass::Thermostat => "thermostat",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle to a host device record mirrored from one hub node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHandle {
    pub id: DeviceId,
    pub address: NodeAddress,
    pub name: String,
    pub class: DeviceClass,
}

impl DeviceHandle {
    pub fn new(
        id: DeviceId,
        address: impl Into<NodeAddress>,
        name: impl Into<String>,
        class: DeviceClass,
    ) -> Self {
        Self {
            id,
            address: address.into(),
            name: name.into(),
            class,
        }
    }
}

/// Thermostat fan setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanMode {
    On,
    Auto,
}

impl FanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::On => "on",
            FanMode::Auto => "auto",
        }
    }
}

/// One normalized state change for a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum StateUpdate {
    OnOff(bool),
    /// Percent, 0..=100
    Brightness(u8),
    Temperature(f64),
    HvacMode(String),
    CoolerOn(bool),
    HeaterOn(bool),
    SetpointHeat(f64),
    SetpointCool(f64),
    FanMode(FanMode),
}

impl StateUpdate {
    /// Host state key this update is written to
    pub fn key(&self) -> &'static str {
        match self {
            StateUpdate::OnOff(_) => "onOffState",
            StateUpdate::Brightness(_) => "brightnessLevel",
            StateUpdate::Temperature(_) => "temperatureInput1",
            StateUpdate::HvacMode(_) => "hvacOperationMode",
            StateUpdate::CoolerOn(_) => "hvacCoolerIsOn",
            StateUpdate::HeaterOn(_) => "hvacHeaterIsOn",
            StateUpdate::SetpointHeat(_) => "setpointHeat",
            StateUpdate::SetpointCool(_) => "setpointCool",
            StateUpdate::FanMode(_) => "hvacFanMode",
        }
    }
}

impl fmt::Display for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::OnOff(v) | StateUpdate::CoolerOn(v) | StateUpdate::HeaterOn(v) => {
                write!(f, "{}={}", self.key(), v)
            }
            StateUpdate::Brightness(v) => write!(f, "{}={}", self.key(), v),
            StateUpdate::Temperature(v)
            | StateUpdate::SetpointHeat(v)
            | StateUpdate::SetpointCool(v) => write!(f, "{}={}", self.key(), v),
            StateUpdate::HvacMode(mode) => write!(f, "{}={}", self.key(), mode),
            StateUpdate::FanMode(mode) => write!(f, "{}={}", self.key(), mode.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keys() {
        assert_eq!(StateUpdate::OnOff(true).key(), "onOffState");
        assert_eq!(StateUpdate::Brightness(50).key(), "brightnessLevel");
        assert_eq!(StateUpdate::SetpointCool(75.0).key(), "setpointCool");
        assert_eq!(StateUpdate::FanMode(FanMode::Auto).key(), "hvacFanMode");
    }

    #[test]
    fn test_update_display() {
        assert_eq!(StateUpdate::Temperature(70.5).to_string(), "temperatureInput1=70.5");
        assert_eq!(StateUpdate::FanMode(FanMode::On).to_string(), "hvacFanMode=on");
    }

    #[test]
    fn test_update_serializes_with_key_tag() {
        let json = serde_json::to_string(&StateUpdate::Brightness(42)).unwrap();
        assert_eq!(json, r#"{"key":"Brightness","value":42}"#);
    }

    #[test]
    fn test_handle_serializes_address_as_string() {
        let handle = DeviceHandle::new(1, "1A 2B 3C 1", "Lamp", DeviceClass::Relay);
        let json = serde_json::to_value(&handle).unwrap();
        assert_eq!(json["address"], "1A 2B 3C 1");
    }
}
