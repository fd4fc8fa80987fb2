//! Configuration menu command codes

use std::fmt;

use crate::error::{Error, Result};

/// Menu command codes
///
/// Each command is a single ASCII character written to the device with no
/// terminator. The mapping must match the firmware's menu table exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // Configuration writes
    SetDefault = b'0',
    SetEndpoint = b'1',
    SetWifiSsid = b'2',
    SetWifiPassword = b'3',
    SetApn = b'4',
    SetDefenderPeriod = b'5',

    // Queries
    GetCertificate = b'6',
    GetThingName = b'7',
    GetConfig = b'8',

    // Mode changes
    Passthrough = b'9',
    ConfigMode = b'A',
    Reset = b'B',
    FactoryReset = b'C',
}

impl Command {
    /// Every command, in wire-code order
    pub const ALL: [Command; 13] = [
        Self::SetDefault,
        Self::SetEndpoint,
        Self::SetWifiSsid,
        Self::SetWifiPassword,
        Self::SetApn,
        Self::SetDefenderPeriod,
        Self::GetCertificate,
        Self::GetThingName,
        Self::GetConfig,
        Self::Passthrough,
        Self::ConfigMode,
        Self::Reset,
        Self::FactoryReset,
    ];

    /// Wire code byte
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Wire code as a character
    pub fn as_char(self) -> char {
        char::from(self.code())
    }

    /// Check if the command is followed by a data line
    pub fn takes_value(self) -> bool {
        matches!(
            self,
            Self::SetEndpoint
                | Self::SetWifiSsid
                | Self::SetWifiPassword
                | Self::SetApn
                | Self::SetDefenderPeriod
        )
    }

    /// Number of drains the firmware needs after the data line
    ///
    /// Password, APN and defender period emit an extra acknowledgement line.
    pub fn value_drains(self) -> usize {
        match self {
            Self::SetWifiPassword | Self::SetApn | Self::SetDefenderPeriod => 2,
            _ => 1,
        }
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::SetDefault => "SET_DEFAULT",
            Self::SetEndpoint => "SET_ENDPOINT",
            Self::SetWifiSsid => "SET_SSID",
            Self::SetWifiPassword => "SET_PASSWORD",
            Self::SetApn => "SET_APN",
            Self::SetDefenderPeriod => "SET_DEFENDER",
            Self::GetCertificate => "GET_CERT",
            Self::GetThingName => "GET_THING_NAME",
            Self::GetConfig => "GET_CONFIG",
            Self::Passthrough => "PASSTHROUGH",
            Self::ConfigMode => "CONF_MODE",
            Self::Reset => "RESET",
            Self::FactoryReset => "FACTORY_RESET",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.code() == value)
            .ok_or(Error::UnknownCommand(value))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.name(), self.as_char())
    }
}

/// Encode a parameter value as a data line (`value` + CR/LF)
///
/// Values containing a line terminator would be split by the firmware into
/// two inputs, so they are rejected.
pub fn data_line(value: &str) -> Result<Vec<u8>> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidValue(value.escape_debug().to_string()));
    }

    let mut line = Vec::with_capacity(value.len() + 2);
    line.extend_from_slice(value.as_bytes());
    line.extend_from_slice(b"\r\n");
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_command_codes() {
        assert_eq!(u8::from(Command::SetDefault), b'0');
        assert_eq!(Command::SetDefenderPeriod.as_char(), '5');
        assert_eq!(Command::Passthrough.as_char(), '9');
        assert_eq!(Command::ConfigMode.as_char(), 'A');
        assert_eq!(Command::FactoryReset.as_char(), 'C');
    }

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<u8> = Command::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), Command::ALL.len());
    }

    #[test]
    fn test_command_conversion() {
        for cmd in Command::ALL {
            assert_eq!(Command::try_from(cmd.code()).unwrap(), cmd);
        }
        assert!(matches!(
            Command::try_from(b'D'),
            Err(Error::UnknownCommand(b'D'))
        ));
    }

    #[test]
    fn test_value_drains() {
        assert_eq!(Command::SetEndpoint.value_drains(), 1);
        assert_eq!(Command::SetWifiSsid.value_drains(), 1);
        assert_eq!(Command::SetWifiPassword.value_drains(), 2);
        assert_eq!(Command::SetApn.value_drains(), 2);
        assert_eq!(Command::SetDefenderPeriod.value_drains(), 2);
    }

    #[test]
    fn test_takes_value() {
        assert!(Command::SetApn.takes_value());
        assert!(!Command::GetThingName.takes_value());
        assert!(!Command::Reset.takes_value());
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::GetCertificate.to_string(), "GET_CERT('6')");
    }

    #[test]
    fn test_data_line() {
        assert_eq!(data_line("my-ssid").unwrap(), b"my-ssid\r\n".to_vec());
        assert_eq!(data_line("").unwrap(), b"\r\n".to_vec());
    }

    #[test]
    fn test_data_line_rejects_terminators() {
        assert!(data_line("two\nlines").is_err());
        assert!(data_line("cr\r").is_err());
    }
}
