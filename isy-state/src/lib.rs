//! # isy-state
//!
//! Device-side state for the hub bridge: the registry mapping node
//! addresses to host device handles, the per-class translators that turn
//! status events into state updates, and logging setup.
//!
//! ```rust,ignore
//! use isy_state::{decoders, DeviceClass, DeviceHandle, DeviceRegistry};
//!
//! let registry = DeviceRegistry::new();
//! registry.insert(DeviceHandle::new(1, "1A 2B 3C 1", "Lamp", DeviceClass::Dimmer { max_brightness: 255 }));
//!
//! let updates = decoders::translate(&DeviceClass::Dimmer { max_brightness: 255 }, "ST", "128")?;
//! ```

pub mod decoders;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;

pub use error::{Result, TranslateError};
pub use logging::{init_logging, init_logging_from_env, LoggingMode};
pub use model::{DeviceClass, DeviceHandle, DeviceId, FanMode, StateUpdate};
pub use registry::{DeviceRegistry, Membership};
