//! Parsers for device reply lines
//!
//! Each parser takes one decoded line and reports what it found without
//! touching the transport, so the menu logic stays a thin sequence of
//! writes, reads and calls into this module.

use crate::constants::{MENU_ACK, THING_NAME_LABEL};

/// Check if the handshake reply acknowledges the menu
///
/// The acknowledgement must start the line.
pub fn is_menu_ack(line: &str) -> bool {
    line.starts_with(MENU_ACK)
}

/// Extract the thing name from a `... ThingName <name> ...` line
///
/// Returns the first whitespace-delimited token after the label, or `None`
/// when the label is missing or nothing follows it.
pub fn extract_thing_name(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(THING_NAME_LABEL)?;
    rest.split_whitespace().next()
}

/// Check if a line carries the text a caller is waiting for
pub fn contains_message(line: &str, target: &str) -> bool {
    line.contains(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_menu_ack() {
        assert!(is_menu_ack("ACK\r\n"));
        assert!(is_menu_ack("ACK menu enabled"));
        assert!(!is_menu_ack(" ACK"));
        assert!(!is_menu_ack("NAK"));
        assert!(!is_menu_ack(""));
    }

    #[test]
    fn test_thing_name() {
        assert_eq!(
            extract_thing_name("ThingName stm32h573-002C005B3332511738363236\r\n"),
            Some("stm32h573-002C005B3332511738363236")
        );
        assert_eq!(
            extract_thing_name("[INFO] ThingName   my-thing extra tokens"),
            Some("my-thing")
        );
        assert_eq!(
            extract_thing_name("> ThingName  dev-01   trailing\r\n"),
            Some("dev-01")
        );
    }

    #[test]
    fn test_thing_name_missing() {
        assert_eq!(extract_thing_name("Endpoint example.com"), None);
        assert_eq!(extract_thing_name("ThingName   \r\n"), None);
        assert_eq!(extract_thing_name(""), None);
    }

    #[test]
    fn test_contains_message() {
        assert!(contains_message("System READY now\r\n", "READY"));
        assert!(!contains_message("System booting\r\n", "READY"));
    }

    proptest! {
        #[test]
        fn thing_name_is_first_token(
            name in "[a-zA-Z0-9_-]{1,40}",
            trailing in "( [a-z]{1,8}){0,3}"
        ) {
            let line = format!("ThingName {name}{trailing}\r\n");
            prop_assert_eq!(extract_thing_name(&line), Some(name.as_str()));
        }
    }
}
