//! Dimmable loads

use super::{parse_number, unhandled, Translator};
use crate::error::Result;
use crate::model::StateUpdate;

/// Translator for dimmers, scaling the hub's raw level to percent
pub struct DimmerTranslator {
    max_brightness: u32,
}

impl DimmerTranslator {
    pub fn new(max_brightness: u32) -> Self {
        Self {
            max_brightness: max_brightness.max(1),
        }
    }

    /// Raw hub level to brightness percent
    pub fn scale(&self, raw: f64) -> u8 {
        let percent = (raw * 100.0 / f64::from(self.max_brightness)).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

impl Translator for DimmerTranslator {
    fn translate(&self, control: &str, action: &str) -> Result<Vec<StateUpdate>> {
        match control {
            "ST" => {
                let raw = parse_number(control, action)?;
                Ok(vec![StateUpdate::Brightness(self.scale(raw))])
            }
            // Level carried with DON/DOF is not reliable, only the on/off edge is
            "DON" => Ok(vec![StateUpdate::OnOff(true)]),
            "DOF" => Ok(vec![StateUpdate::OnOff(false)]),
            _ => Err(unhandled("dimmer", control)),
        }
    }
}
