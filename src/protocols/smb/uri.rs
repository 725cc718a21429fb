/*!
 * Endpoint address parsing for SMB URIs
 */

use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{NegotiationError, Result};

/// Normalized SMB endpoint: `smb://host[:port]/share/path`
///
/// `cifs://` is accepted and normalized to `smb://`. The host is lowercased
/// and any user info in the URI is dropped; credentials come from the
/// credential store, never from the address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress {
    host: String,
    port: Option<u16>,
    path: String,
}

impl EndpointAddress {
    /// Parse and normalize an SMB URI
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| NegotiationError::InvalidAddress(format!("{}: {}", input, e)))?;

        match url.scheme() {
            "smb" | "cifs" => {}
            other => {
                return Err(NegotiationError::InvalidAddress(format!(
                    "unsupported scheme '{}' in {}",
                    other, input
                )))
            }
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| NegotiationError::InvalidAddress(format!("missing host in {}", input)))?
            .to_ascii_lowercase();

        let path = if url.path().is_empty() {
            "/".to_string()
        } else {
            url.path().to_string()
        };

        Ok(Self {
            host,
            port: url.port(),
            path,
        })
    }

    /// Address of the server root on the same host and port, no share
    pub fn server_root(&self) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            path: "/".to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path component, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First path segment, if any
    pub fn share(&self) -> Option<&str> {
        self.path.split('/').find(|s| !s.is_empty())
    }

    pub fn is_server_root(&self) -> bool {
        self.share().is_none()
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "smb://{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        f.write_str(&self.path)
    }
}

impl FromStr for EndpointAddress {
    type Err = NegotiationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
