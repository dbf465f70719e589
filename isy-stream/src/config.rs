//! Configuration types for hub subscriptions

use std::time::Duration;

use soap_client::Credentials;

use crate::error::{Result, StreamError};

/// Timing and transport settings shared by every hub subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// TCP port of the hub's web service
    /// Default: 80
    pub port: u16,

    /// Connect, read and write timeout on the subscription socket. A read
    /// timing out is not an error; it only lets the worker re-check its flags.
    /// Default: 30 seconds
    pub io_timeout: Duration,

    /// Delay before reconnecting after a failed connect or handshake
    /// Default: 5 seconds
    pub retry_delay: Duration,

    /// Time without a heartbeat after which the connection is considered dead
    /// Default: 250 seconds
    pub heartbeat_timeout: Duration,

    /// How long `stop` waits for the worker thread to exit
    /// Default: 40 seconds
    pub shutdown_grace: Duration,

    /// Timeout on the short-lived connection used to unsubscribe
    /// Default: 10 seconds
    pub unsubscribe_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            port: 80,
            io_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(250),
            shutdown_grace: Duration::from_secs(40),
            unsubscribe_timeout: Duration::from_secs(10),
        }
    }
}

impl StreamConfig {
    /// Create a new StreamConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_unsubscribe_timeout(mut self, timeout: Duration) -> Self {
        self.unsubscribe_timeout = timeout;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(StreamError::Configuration(
                "Port must be greater than 0".to_string(),
            ));
        }

        let durations = [
            ("I/O timeout", self.io_timeout),
            ("Retry delay", self.retry_delay),
            ("Heartbeat timeout", self.heartbeat_timeout),
            ("Shutdown grace", self.shutdown_grace),
            ("Unsubscribe timeout", self.unsubscribe_timeout),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(StreamError::Configuration(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.heartbeat_timeout <= self.io_timeout {
            return Err(StreamError::Configuration(
                "Heartbeat timeout must be longer than the I/O timeout".to_string(),
            ));
        }

        Ok(())
    }
}

/// Identity and address of one hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Host-side numeric id, used to prefix program ids
    pub id: u32,
    /// Hub uuid as advertised over discovery
    pub uuid: String,
    /// Display name used in event viewer messages
    pub name: String,
    /// Host name or IP address
    pub address: String,
    pub credentials: Credentials,
}

impl HubConfig {
    pub fn new(
        id: u32,
        uuid: impl Into<String>,
        address: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let uuid = uuid.into();
        Self {
            id,
            name: uuid.clone(),
            uuid,
            address: address.into(),
            credentials,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.uuid.trim().is_empty() {
            return Err(StreamError::Configuration("Hub uuid is empty".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(StreamError::Configuration(format!(
                "Hub {} has no address",
                self.uuid
            )));
        }
        Ok(())
    }
}
