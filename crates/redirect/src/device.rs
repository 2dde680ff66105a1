//! Device names.
//!
//! A device name is `"<scheme>:<value>"`, optionally followed by a
//! `/<service>` suffix that is dropped. The scheme is matched
//! case-insensitively and MAC addresses are normalized, so every spelling of
//! the same device hashes to the same ring position.

use std::fmt;
use std::str::FromStr;

/// Number of hex digits in a MAC address.
const MAC_DIGITS: usize = 12;

/// Recognised device name schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `mac:` followed by 12 hex digits, with optional separators.
    Mac,
    Uuid,
    Dns,
    /// Vendor serial number.
    Serial,
}

impl Scheme {
    /// Lowercase scheme prefix without the colon.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Mac => "mac",
            Scheme::Uuid => "uuid",
            Scheme::Dns => "dns",
            Scheme::Serial => "serial",
        }
    }
}

impl FromStr for Scheme {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mac" => Ok(Scheme::Mac),
            "uuid" => Ok(Scheme::Uuid),
            "dns" => Ok(Scheme::Dns),
            "serial" => Ok(Scheme::Serial),
            _ => Err(DeviceIdError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a device name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceIdError {
    /// Nothing but whitespace.
    #[error("device name is empty")]
    Empty,

    /// No `scheme:` prefix.
    #[error("device name {0:?} has no scheme")]
    MissingScheme(String),

    /// The prefix is not one of [`Scheme`].
    #[error("unknown device scheme {0:?}")]
    UnknownScheme(String),

    /// Nothing between the scheme and the end or the service suffix.
    #[error("device name has an empty {0} value")]
    EmptyValue(Scheme),

    /// A `mac:` value that is not 12 hex digits.
    #[error("invalid MAC address {0:?}")]
    InvalidMac(String),
}

/// A parsed, canonical device name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId {
    scheme: Scheme,
    value: String,
}

impl DeviceId {
    /// Parse and normalize a device name.
    ///
    /// Anything from the first `/` of the value on names a service on the
    /// device and is ignored.
    ///
    /// ```
    /// use redirect::DeviceId;
    ///
    /// let id = DeviceId::parse("MAC:11-22-33-AA-BB-CC").unwrap();
    /// assert_eq!(id.to_string(), "mac:112233aabbcc");
    ///
    /// let id = DeviceId::parse("serial:abc/config").unwrap();
    /// assert_eq!(id.to_string(), "serial:abc");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, DeviceIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DeviceIdError::Empty);
        }

        let (scheme, value) = raw
            .split_once(':')
            .ok_or_else(|| DeviceIdError::MissingScheme(raw.to_string()))?;
        let scheme: Scheme = scheme.parse()?;
        let value = value.split_once('/').map_or(value, |(id, _)| id);
        if value.is_empty() {
            return Err(DeviceIdError::EmptyValue(scheme));
        }

        let value = match scheme {
            Scheme::Mac => normalize_mac(value)?,
            _ => value.to_string(),
        };
        Ok(Self { scheme, value })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The canonical value, without scheme or service suffix.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::parse(s)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.value)
    }
}

fn normalize_mac(value: &str) -> Result<String, DeviceIdError> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.' | ','))
        .collect();

    if digits.len() != MAC_DIGITS || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeviceIdError::InvalidMac(value.to_string()));
    }
    Ok(digits.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_spellings_normalize_together() {
        let canonical = DeviceId::parse("mac:112233445566").unwrap();
        for raw in [
            "MAC:11-22-33-44-55-66",
            "mac:11:22:33:44:55:66",
            "Mac:1122.3344.5566",
            "mac:11,22,33,44,55,66",
            "  mac:112233445566 ",
        ] {
            assert_eq!(DeviceId::parse(raw).unwrap(), canonical, "{raw}");
        }
        assert_eq!(canonical.to_string(), "mac:112233445566");
    }

    #[test]
    fn test_mac_hex_is_lowercased() {
        let id = DeviceId::parse("mac:AABBCCDDEEFF").unwrap();
        assert_eq!(id.value(), "aabbccddeeff");
    }

    #[test]
    fn test_invalid_macs() {
        for raw in ["mac:1122334455", "mac:11223344556677", "mac:11223344556g"] {
            assert!(matches!(
                DeviceId::parse(raw),
                Err(DeviceIdError::InvalidMac(_))
            ));
        }
    }

    #[test]
    fn test_other_schemes_keep_value() {
        let id = DeviceId::parse("SERIAL:AbC-123").unwrap();
        assert_eq!(id.scheme(), Scheme::Serial);
        assert_eq!(id.to_string(), "serial:AbC-123");

        let id = DeviceId::parse("dns:device.example.com").unwrap();
        assert_eq!(id.to_string(), "dns:device.example.com");

        let id: DeviceId = "uuid:0f3c6e1a-2b".parse().unwrap();
        assert_eq!(id.scheme(), Scheme::Uuid);
    }

    #[test]
    fn test_service_suffix_is_ignored() {
        assert_eq!(
            DeviceId::parse("serial:abc/svc").unwrap(),
            DeviceId::parse("serial:abc").unwrap()
        );
        assert_eq!(
            DeviceId::parse("mac:11-22-33-44-55-66/iot").unwrap().to_string(),
            "mac:112233445566"
        );
        assert_eq!(
            DeviceId::parse("dns:host.example.com/a/b").unwrap().value(),
            "host.example.com"
        );
        assert_eq!(
            DeviceId::parse("serial:/svc"),
            Err(DeviceIdError::EmptyValue(Scheme::Serial))
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(DeviceId::parse(""), Err(DeviceIdError::Empty));
        assert!(matches!(
            DeviceId::parse("112233445566"),
            Err(DeviceIdError::MissingScheme(_))
        ));
        assert!(matches!(
            DeviceId::parse("imei:490154203237518"),
            Err(DeviceIdError::UnknownScheme(_))
        ));
        assert_eq!(
            DeviceId::parse("serial:"),
            Err(DeviceIdError::EmptyValue(Scheme::Serial))
        );
    }
}
