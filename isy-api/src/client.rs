use std::time::Duration;

use isy_parser::NodeAddress;
use serde::Deserialize;
use soap_client::Credentials;
use url::Url;

use crate::{ApiError, Result};

/// Lowest and highest thermostat setpoint the bridge will send, in degrees
pub const SETPOINT_RANGE: std::ops::RangeInclusive<f64> = 60.0..=85.0;

/// Timeouts for REST calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Commands the subscription dispatcher needs to send back to the hub
pub trait CommandSender: Send + Sync {
    /// Ask the hub to re-report the status of a node
    fn query_device(&self, address: &NodeAddress) -> Result<()>;
}

/// Blocking REST client for one hub
///
/// Every command is a `GET` under `/rest/` with Basic auth. Node addresses
/// contain spaces and are percent-encoded as single path segments.
#[derive(Debug, Clone)]
pub struct IsyClient {
    agent: ureq::Agent,
    base: Url,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(rename = "@succeeded")]
    succeeded: Option<String>,
    status: Option<String>,
}

impl IsyClient {
    /// Client for the hub at `address` (`host` or `host:port`)
    pub fn new(address: &str, credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&format!("http://{}/", address))?;
        Self::with_base_url(base, credentials, config)
    }

    /// Client for an explicit base URL
    pub fn with_base_url(base: Url, credentials: Credentials, config: ClientConfig) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base.to_string()));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();
        Ok(Self {
            agent,
            base,
            credentials,
        })
    }

    /// Turn a node on at its configured on-level
    pub fn device_on(&self, address: &NodeAddress) -> Result<()> {
        self.send(&["nodes", address.as_str(), "cmd", "DON"])
    }

    /// Turn a node on at a raw hub level (0..=max brightness)
    pub fn device_on_level(&self, address: &NodeAddress, level: u32) -> Result<()> {
        self.send(&["nodes", address.as_str(), "cmd", "DON", &level.to_string()])
    }

    pub fn device_off(&self, address: &NodeAddress) -> Result<()> {
        self.send(&["nodes", address.as_str(), "cmd", "DOF"])
    }

    /// Set a dimmer to `percent` brightness, scaled to the device's raw range
    pub fn set_brightness(&self, address: &NodeAddress, percent: u8, max_brightness: u32) -> Result<()> {
        self.device_on_level(address, scale_brightness(percent, max_brightness))
    }

    /// Run a program command such as `run`, `runThen`, `runElse`, `stop`
    pub fn program_command(&self, program_id: &str, command: &str) -> Result<()> {
        self.send(&["programs", program_id, command])
    }

    pub fn set_hvac_mode(&self, address: &NodeAddress, mode: &str) -> Result<()> {
        self.send(&["nodes", address.as_str(), "set", "CLIMD", mode])
    }

    /// Set the thermostat fan to always on (`true`) or automatic (`false`)
    pub fn set_fan_mode(&self, address: &NodeAddress, on: bool) -> Result<()> {
        let mode = if on { "7" } else { "8" };
        self.send(&["nodes", address.as_str(), "set", "CLIFS", mode])
    }

    pub fn set_heat_setpoint(&self, address: &NodeAddress, degrees: f64) -> Result<()> {
        let raw = setpoint_half_degrees(degrees).to_string();
        self.send(&["nodes", address.as_str(), "set", "CLISPH", &raw])
    }

    pub fn set_cool_setpoint(&self, address: &NodeAddress, degrees: f64) -> Result<()> {
        let raw = setpoint_half_degrees(degrees).to_string();
        self.send(&["nodes", address.as_str(), "set", "CLISPC", &raw])
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("rest")
            .extend(segments);
        Ok(url)
    }

    fn send(&self, segments: &[&str]) -> Result<()> {
        let url = self.url_for(segments)?;
        tracing::debug!(url = %url, "sending REST command");

        let body = self
            .agent
            .get(url.as_str())
            .set("Authorization", &self.credentials.basic_auth_header())
            .call()?
            .into_string()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        check_rest_response(&body)
    }
}

impl CommandSender for IsyClient {
    fn query_device(&self, address: &NodeAddress) -> Result<()> {
        self.send(&["query", address.as_str()])
    }
}

/// Raw hub level for a brightness percentage, truncating like the hub's own UI
pub fn scale_brightness(percent: u8, max_brightness: u32) -> u32 {
    u32::from(percent.min(100)) * max_brightness / 100
}

/// Setpoint clamped to [`SETPOINT_RANGE`] in the hub's half-degree units
pub fn setpoint_half_degrees(degrees: f64) -> u32 {
    let clamped = if degrees.is_nan() {
        *SETPOINT_RANGE.start()
    } else {
        degrees.clamp(*SETPOINT_RANGE.start(), *SETPOINT_RANGE.end())
    };
    (clamped * 2.0) as u32
}

fn check_rest_response(body: &str) -> Result<()> {
    if !body.contains("<RestResponse") {
        return Ok(());
    }
    let response: RestResponse =
        quick_xml::de::from_str(body.trim()).map_err(|e| ApiError::ParseError(e.to_string()))?;

    match response.succeeded.as_deref() {
        Some("false") => Err(ApiError::CommandRejected(
            response.status.unwrap_or_else(|| "unknown".to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn client() -> IsyClient {
        IsyClient::new("192.168.1.20", Credentials::new("admin", "admin"), ClientConfig::default())
            .unwrap()
    }

    #[test]
    fn test_url_encodes_node_address() {
        let url = client().url_for(&["query", "1A 2B 3C 1"]).unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.20/rest/query/1A%202B%203C%201");
    }

    #[test]
    fn test_url_with_port() {
        let client =
            IsyClient::new("hub.local:8080", Credentials::new("a", "b"), ClientConfig::default())
                .unwrap();
        let url = client.url_for(&["programs", "0004", "runThen"]).unwrap();
        assert_eq!(url.as_str(), "http://hub.local:8080/rest/programs/0004/runThen");
    }

    #[test]
    fn test_invalid_address() {
        let result = IsyClient::new("bad host", Credentials::new("a", "b"), ClientConfig::default());
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[rstest]
    #[case(100, 255, 255)]
    #[case(50, 255, 127)]
    #[case(0, 255, 0)]
    #[case(150, 100, 100)]
    #[case(33, 100, 33)]
    fn test_scale_brightness(#[case] percent: u8, #[case] max: u32, #[case] expected: u32) {
        assert_eq!(scale_brightness(percent, max), expected);
    }

    #[rstest]
    #[case(70.0, 140)]
    #[case(70.5, 141)]
    #[case(50.0, 120)]
    #[case(90.0, 170)]
    #[case(f64::NAN, 120)]
    fn test_setpoint_half_degrees(#[case] degrees: f64, #[case] expected: u32) {
        assert_eq!(setpoint_half_degrees(degrees), expected);
    }

    #[rstest]
    #[case::plain_ok("", true)]
    #[case::success(r#"<RestResponse succeeded="true"><status>200</status></RestResponse>"#, true)]
    #[case::failure(r#"<RestResponse succeeded="false"><status>404</status></RestResponse>"#, false)]
    #[case::with_decl(r#"<?xml version="1.0" encoding="UTF-8"?><RestResponse succeeded="false"><status>500</status></RestResponse>"#, false)]
    fn test_check_rest_response(#[case] body: &str, #[case] ok: bool) {
        assert_eq!(check_rest_response(body).is_ok(), ok);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_setpoint_always_in_range(degrees in any::<f64>()) {
            let raw = setpoint_half_degrees(degrees);
            prop_assert!((120..=170).contains(&raw));
        }

        #[test]
        fn test_brightness_never_exceeds_max(percent in any::<u8>(), max in 1u32..=1000) {
            prop_assert!(scale_brightness(percent, max) <= max);
        }
    }

    #[test]
    fn test_rejection_carries_status() {
        let body = r#"<RestResponse succeeded="false"><status>404</status></RestResponse>"#;
        match check_rest_response(body) {
            Err(ApiError::CommandRejected(status)) => assert_eq!(status, "404"),
            other => panic!("expected CommandRejected, got {:?}", other),
        }
    }
}
