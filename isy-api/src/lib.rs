//! # isy-api
//!
//! Blocking REST client for sending commands to an ISY hub.
//!
//! ```rust,ignore
//! use isy_api::{ClientConfig, CommandSender, IsyClient};
//! use soap_client::Credentials;
//!
//! let client = IsyClient::new("192.168.1.20", Credentials::new("admin", "admin"), ClientConfig::default())?;
//! client.device_on(&"1A 2B 3C 1".into())?;
//! client.query_device(&"1A 2B 3C 1".into())?;
//! ```

mod client;
mod error;

pub use client::{
    scale_brightness, setpoint_half_degrees, ClientConfig, CommandSender, IsyClient,
    SETPOINT_RANGE,
};
pub use error::{ApiError, Result};
