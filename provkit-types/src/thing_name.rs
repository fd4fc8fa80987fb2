//! Device identity within the fleet

use std::fmt;

use crate::error::{Error, Result};

/// Name the device is registered under
///
/// A single token: non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThingName(String);

impl ThingName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("thing name is empty".into()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "thing name contains whitespace: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ThingName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thing_name_valid() {
        let name = ThingName::new("stm32h573-002C005B3332511738363236").unwrap();
        assert_eq!(name.as_str(), "stm32h573-002C005B3332511738363236");
        assert_eq!(name.to_string(), "stm32h573-002C005B3332511738363236");
    }

    #[test]
    fn test_thing_name_invalid() {
        assert!(ThingName::new("").is_err());
        assert!(ThingName::new("two words").is_err());
        assert!(ThingName::new("trailing\r").is_err());
    }
}
