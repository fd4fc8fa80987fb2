//! Device certificate as reported by the configuration menu

use std::fmt;

use crate::error::{Error, Result};

/// First line of a PEM certificate
pub const BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// Last line of a PEM certificate
pub const END_MARKER: &str = "-----END CERTIFICATE-----";

/// PEM-encoded X.509 certificate
///
/// The content between the markers is kept opaque. Lines are normalized to
/// `\n` endings and the text always ends with a newline after the end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pem: String,
}

impl Certificate {
    /// Check if a line opens a certificate
    pub fn is_begin_line(line: &str) -> bool {
        line.starts_with(BEGIN_MARKER)
    }

    /// Check if a line closes a certificate
    pub fn is_end_line(line: &str) -> bool {
        line.starts_with(END_MARKER)
    }

    /// Parse PEM text
    pub fn from_pem(text: &str) -> Result<Self> {
        Self::from_lines(text.lines())
    }

    /// Assemble a certificate from the lines of a device reply
    ///
    /// Line terminators are stripped; blank lines are skipped.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim_end_matches(['\r', '\n']).to_string())
            .filter(|line| !line.trim().is_empty())
            .collect();

        match (lines.first(), lines.last()) {
            (Some(first), Some(last)) if Self::is_begin_line(first) && Self::is_end_line(last) => {}
            (Some(first), _) if !Self::is_begin_line(first) => {
                return Err(Error::Parse(format!(
                    "certificate does not start with {}",
                    BEGIN_MARKER
                )));
            }
            _ => {
                return Err(Error::Parse(format!("certificate is missing {}", END_MARKER)));
            }
        }

        if lines.len() < 3 {
            return Err(Error::Parse("certificate has no body".into()));
        }

        let mut pem = lines.join("\n");
        pem.push('\n');
        Ok(Self { pem })
    }

    /// Full PEM text, markers included
    pub fn as_pem(&self) -> &str {
        &self.pem
    }

    /// Base64 body lines between the markers
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        let lines: Vec<&str> = self.pem.lines().collect();
        let end = lines.len().saturating_sub(1);
        lines.into_iter().take(end).skip(1)
    }

    pub fn into_pem(self) -> String {
        self.pem
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\r\n\
                       MIICnDCCAYSgAwIBAgIVAK0zcwFkjFYB\r\n\
                       CwUAME0xSzBJBgNVBAsMQkFtYXpvbiBX\r\n\
                       -----END CERTIFICATE-----\r\n";

    #[test]
    fn test_from_pem_normalizes_line_endings() {
        let cert = Certificate::from_pem(PEM).unwrap();
        assert_eq!(
            cert.as_pem(),
            "-----BEGIN CERTIFICATE-----\n\
             MIICnDCCAYSgAwIBAgIVAK0zcwFkjFYB\n\
             CwUAME0xSzBJBgNVBAsMQkFtYXpvbiBX\n\
             -----END CERTIFICATE-----\n"
        );
    }

    #[test]
    fn test_body_lines() {
        let cert = Certificate::from_pem(PEM).unwrap();
        let body: Vec<&str> = cert.body_lines().collect();
        assert_eq!(
            body,
            vec!["MIICnDCCAYSgAwIBAgIVAK0zcwFkjFYB", "CwUAME0xSzBJBgNVBAsMQkFtYXpvbiBX"]
        );
    }

    #[test]
    fn test_missing_markers() {
        assert!(Certificate::from_pem("MIICnDCC\n-----END CERTIFICATE-----\n").is_err());
        assert!(Certificate::from_pem("-----BEGIN CERTIFICATE-----\nMIICnDCC\n").is_err());
        assert!(Certificate::from_pem("").is_err());
    }

    #[test]
    fn test_empty_body() {
        let result =
            Certificate::from_pem("-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_marker_lines() {
        assert!(Certificate::is_begin_line("-----BEGIN CERTIFICATE-----\r\n"));
        assert!(!Certificate::is_begin_line("> -----BEGIN CERTIFICATE-----"));
        assert!(Certificate::is_end_line("-----END CERTIFICATE-----\r\n"));
    }
}
