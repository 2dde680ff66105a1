//! Identifier extraction.

use axum::http::header::HeaderName;
use axum::http::request::Parts;

use crate::device::DeviceId;
use crate::error::{ConfigError, RouteError};

/// Header carrying the device name unless configured otherwise.
pub const DEFAULT_DEVICE_HEADER: &str = "X-Webpa-Device-Name";

/// Pulls the routing identifier out of a request.
///
/// The returned string is what gets hashed, so implementations must return
/// the same string for every spelling of the same device.
pub trait IdentifierExtractor: Send + Sync + 'static {
    /// Canonical identifier for the request, or
    /// [`RouteError::MissingIdentifier`] if there is none.
    fn extract(&self, parts: &Parts) -> Result<String, RouteError>;
}

/// Reads a [`DeviceId`] from a request header.
#[derive(Clone, Debug)]
pub struct HeaderExtractor {
    header: HeaderName,
}

impl HeaderExtractor {
    /// Read device names from `header`. Fails if it is not a valid header
    /// name.
    pub fn new(header: &str) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|_| ConfigError::HeaderName(header.to_string()))?;
        Ok(Self { header })
    }

    /// The header being read.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static("x-webpa-device-name"),
        }
    }
}

impl IdentifierExtractor for HeaderExtractor {
    fn extract(&self, parts: &Parts) -> Result<String, RouteError> {
        let value = parts
            .headers
            .get(&self.header)
            .ok_or_else(|| RouteError::missing(format!("no {} header", self.header)))?;
        let value = value
            .to_str()
            .map_err(|_| RouteError::missing(format!("{} header is not text", self.header)))?;

        DeviceId::parse(value)
            .map(|id| id.to_string())
            .map_err(|err| RouteError::missing(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/v2/device");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_default_header_is_case_insensitive() {
        let extractor = HeaderExtractor::default();
        let id = extractor
            .extract(&parts(&[("x-webpa-device-name", "MAC:AA-BB-CC-DD-EE-FF")]))
            .unwrap();
        assert_eq!(id, "mac:aabbccddeeff");
        assert_eq!(
            HeaderExtractor::new(DEFAULT_DEVICE_HEADER).unwrap().header(),
            extractor.header()
        );
    }

    #[test]
    fn test_custom_header() {
        let extractor = HeaderExtractor::new("X-Device-Id").unwrap();
        let id = extractor
            .extract(&parts(&[("X-Device-Id", "serial:42")]))
            .unwrap();
        assert_eq!(id, "serial:42");
        assert!(extractor
            .extract(&parts(&[(DEFAULT_DEVICE_HEADER, "serial:42")]))
            .is_err());
    }

    #[test]
    fn test_missing_and_malformed() {
        let extractor = HeaderExtractor::default();
        assert!(matches!(
            extractor.extract(&parts(&[])),
            Err(RouteError::MissingIdentifier { .. })
        ));
        assert!(matches!(
            extractor.extract(&parts(&[(DEFAULT_DEVICE_HEADER, "not-a-device")])),
            Err(RouteError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn test_invalid_header_name() {
        assert_eq!(
            HeaderExtractor::new("bad header").unwrap_err(),
            ConfigError::HeaderName("bad header".to_string())
        );
    }
}
