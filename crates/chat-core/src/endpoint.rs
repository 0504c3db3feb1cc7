//! WebSocket endpoint addresses.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::errors::EndpointError;

/// Address used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

/// A validated `ws://` or `wss://` address, kept in normalized URL form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Parse and validate an address. Surrounding whitespace is ignored.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(EndpointError::Empty);
        }

        let parsed = Url::parse(address).map_err(|e| match e {
            url::ParseError::EmptyHost => EndpointError::MissingHost {
                address: address.to_string(),
            },
            other => EndpointError::Malformed {
                address: address.to_string(),
                source: other,
            },
        })?;

        match parsed.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(EndpointError::UnsupportedScheme {
                    scheme: other.to_string(),
                });
            }
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost {
                address: address.to_string(),
            });
        }

        Ok(Self(parsed.into()))
    }

    /// The normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self(DEFAULT_ENDPOINT.to_string())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
