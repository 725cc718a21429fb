//! SMB protocol types shared by the negotiation layer and the capability

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Username used when no credential is stored for an endpoint
pub const GUEST_USERNAME: &str = "GUEST";

/// SMB protocol dialect family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Legacy CIFS/SMBv1
    Smb1,

    /// SMB 2.x and later
    Smb2,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Smb1 => f.write_str("SMBv1"),
            Dialect::Smb2 => f.write_str("SMBv2"),
        }
    }
}

/// Secret wrapper for credentials
///
/// Zeroes memory on drop and never prints its content.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(pub String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

/// Username/password pair stored for an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: Secret,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// NTLM identity presented to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtlmAuth {
    pub domain: String,
    pub username: String,
    pub password: Secret,
}

impl NtlmAuth {
    /// Anonymous guest identity: empty domain, `GUEST`, empty password
    pub fn guest() -> Self {
        Self {
            domain: String::new(),
            username: GUEST_USERNAME.to_string(),
            password: Secret::default(),
        }
    }

    /// Identity for a stored credential; the domain is always empty
    pub fn from_credential(credential: Credential) -> Self {
        Self {
            domain: String::new(),
            username: credential.username,
            password: credential.password,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.domain.is_empty() && self.username == GUEST_USERNAME && self.password.is_empty()
    }
}

/// What a remote entry turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEntryKind {
    File,
    Directory,
    /// Pipes, printers, transient objects and anything the server could not type
    Other,
}

/// One entry returned by a remote enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    path: String,
    kind: RemoteEntryKind,
}

impl RemoteEntry {
    pub fn new(path: impl Into<String>, kind: RemoteEntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, RemoteEntryKind::File)
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::new(path, RemoteEntryKind::Directory)
    }

    pub fn other(path: impl Into<String>) -> Self {
        Self::new(path, RemoteEntryKind::Other)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> RemoteEntryKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == RemoteEntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == RemoteEntryKind::Directory
    }
}
