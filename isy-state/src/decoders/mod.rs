//! Status event translators for each device class
//!
//! Each translator turns a raw `(control, action)` pair from a device status
//! event into normalized [`StateUpdate`]s. Controls a class knowingly ignores
//! produce an empty list; controls it has no meaning for are errors.

mod dimmer;
mod relay;
mod thermostat;

pub use dimmer::DimmerTranslator;
pub use relay::RelayTranslator;
pub use thermostat::ThermostatTranslator;

use crate::error::{Result, TranslateError};
use crate::model::{DeviceClass, StateUpdate};

/// Converts one status event into state updates for a device class
pub trait Translator {
    /// Translate a status event
    fn translate(&self, control: &str, action: &str) -> Result<Vec<StateUpdate>>;
}

/// Translate a status event for a device of the given class
pub fn translate(class: &DeviceClass, control: &str, action: &str) -> Result<Vec<StateUpdate>> {
    match class {
        DeviceClass::Relay | DeviceClass::Irrigation | DeviceClass::IoDevice => {
            RelayTranslator.translate(control, action)
        }
        DeviceClass::Dimmer { max_brightness } => {
            DimmerTranslator::new(*max_brightness).translate(control, action)
        }
        DeviceClass::Thermostat => ThermostatTranslator.translate(control, action),
    }
}

fn parse_number(control: &str, action: &str) -> Result<f64> {
    action
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| TranslateError::InvalidNumber {
            control: control.to_string(),
            action: action.to_string(),
        })
}

fn unhandled(class: &'static str, control: &str) -> TranslateError {
    TranslateError::UnhandledControl {
        class,
        control: control.to_string(),
    }
}
