//! On/off devices: relays, irrigation valves, I/O modules

use super::{unhandled, Translator};
use crate::error::Result;
use crate::model::StateUpdate;

/// Translator for on/off devices
pub struct RelayTranslator;

impl Translator for RelayTranslator {
    fn translate(&self, control: &str, action: &str) -> Result<Vec<StateUpdate>> {
        match control {
            // Both levels are reported as "on" depending on device firmware
            "ST" => Ok(vec![StateUpdate::OnOff(matches!(action.trim(), "255" | "100"))]),
            _ => Err(unhandled("relay", control)),
        }
    }
}
