//! Settings written to the device through the configuration menu

use crate::error::{Error, Result};

/// Values to apply during provisioning
///
/// Every field is optional; only the present ones are written, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSettings {
    /// MQTT broker endpoint, e.g. `xxxxxxxx-ats.iot.us-west-1.amazonaws.com`
    pub endpoint: Option<String>,

    pub wifi_ssid: Option<String>,

    pub wifi_password: Option<String>,

    /// Cellular access point name
    pub apn: Option<String>,

    /// Device Defender metrics period in seconds
    pub defender_period: Option<u32>,
}

impl DeviceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_wifi(mut self, ssid: impl Into<String>, password: impl Into<String>) -> Self {
        self.wifi_ssid = Some(ssid.into());
        self.wifi_password = Some(password.into());
        self
    }

    pub fn with_apn(mut self, apn: impl Into<String>) -> Self {
        self.apn = Some(apn.into());
        self
    }

    pub fn with_defender_period(mut self, seconds: u32) -> Self {
        self.defender_period = Some(seconds);
        self
    }

    /// Check if there is nothing to write
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject values the menu cannot accept as a single input line
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("endpoint", self.endpoint.as_deref()),
            ("wifi_ssid", self.wifi_ssid.as_deref()),
            ("wifi_password", self.wifi_password.as_deref()),
            ("apn", self.apn.as_deref()),
        ];

        for (name, value) in fields {
            if let Some(value) = value {
                if value.contains(['\r', '\n']) {
                    return Err(Error::Validation(format!("{} contains a line break", name)));
                }
            }
        }

        if self.endpoint.as_deref() == Some("") {
            return Err(Error::Validation("endpoint is empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let settings = DeviceSettings::new()
            .with_endpoint("example-ats.iot.us-west-1.amazonaws.com")
            .with_wifi("lab", "secret")
            .with_defender_period(300);

        assert_eq!(settings.wifi_ssid.as_deref(), Some("lab"));
        assert_eq!(settings.defender_period, Some(300));
        assert!(settings.apn.is_none());
        assert!(!settings.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty() {
        assert!(DeviceSettings::new().is_empty());
        assert!(DeviceSettings::new().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        let settings = DeviceSettings::new().with_wifi("lab\r\n", "secret");
        assert!(settings.validate().is_err());

        let settings = DeviceSettings::new().with_endpoint("");
        assert!(settings.validate().is_err());
    }
}
