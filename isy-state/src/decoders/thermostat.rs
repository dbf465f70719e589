//! Thermostats
//!
//! Temperatures and setpoints arrive in half-degree units.

use super::{parse_number, unhandled, Translator};
use crate::error::{Result, TranslateError};
use crate::model::{FanMode, StateUpdate};

/// Translator for thermostat status events
pub struct ThermostatTranslator;

impl ThermostatTranslator {
    fn half_degrees(control: &str, action: &str) -> Result<f64> {
        Ok(parse_number(control, action)? / 2.0)
    }
}

fn invalid(control: &str, action: &str) -> TranslateError {
    TranslateError::InvalidParameter {
        control: control.to_string(),
        action: action.to_string(),
    }
}

impl Translator for ThermostatTranslator {
    fn translate(&self, control: &str, action: &str) -> Result<Vec<StateUpdate>> {
        let updates = match control {
            "ST" => vec![StateUpdate::Temperature(Self::half_degrees(control, action)?)],
            "CLIMD" => {
                let mode = action
                    .replace(' ', "")
                    .replace("ProgramAuto", "ProgramHeatCool");
                vec![StateUpdate::HvacMode(mode)]
            }
            "CLIHCS" => {
                let (cooler, heater) = match action.trim() {
                    "0" => (false, false),
                    "1" => (false, true),
                    "2" => (true, false),
                    _ => return Err(invalid(control, action)),
                };
                vec![StateUpdate::CoolerOn(cooler), StateUpdate::HeaterOn(heater)]
            }
            "CLISPH" => vec![StateUpdate::SetpointHeat(Self::half_degrees(control, action)?)],
            "CLISPC" => vec![StateUpdate::SetpointCool(Self::half_degrees(control, action)?)],
            "CLIFS" => match action.trim() {
                "7" => vec![StateUpdate::FanMode(FanMode::On)],
                "8" => vec![StateUpdate::FanMode(FanMode::Auto)],
                _ => return Err(invalid(control, action)),
            },
            // humidity, unit of measure
            "CLIHUM" | "UOM" => Vec::new(),
            _ => return Err(unhandled("thermostat", control)),
        };
        Ok(updates)
    }
}
