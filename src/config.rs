/*!
 * Configuration types for dialect negotiation
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{NegotiationError, Result};
use crate::protocols::smb::Dialect;

/// Main configuration for the negotiation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Allow strict single-dialect negotiation when the user enables it.
    /// When false the permissive contexts are always used.
    #[serde(default = "default_true")]
    pub limit_protocol_negotiation: bool,

    /// Dialect of the permissive context used while strict negotiation is off
    #[serde(default = "default_permissive_dialect")]
    pub permissive_dialect: Dialect,

    /// Context used when probing could not identify the server dialect
    #[serde(default)]
    pub unresolved_fallback: UnresolvedFallback,

    /// Properties shared by every negotiation context
    #[serde(default)]
    pub properties: BaseProperties,
}

/// Negotiation properties applied to all four contexts before the
/// per-context dialect overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseProperties {
    /// Name resolution order (BCAST, DNS, WINS, LMHOSTS)
    #[serde(default = "default_resolve_order")]
    pub resolve_order: Vec<String>,

    /// Enforce signing on IPC connections
    #[serde(default)]
    pub ipc_signing_enforced: bool,

    /// Refuse to fall back to plaintext passwords
    #[serde(default)]
    pub disable_plaintext_passwords: bool,

    /// Disable DFS referrals
    #[serde(default = "default_true")]
    pub dfs_disabled: bool,

    /// Skip SPNEGO integrity checks
    #[serde(default)]
    pub disable_spnego_integrity: bool,

    /// Additional properties passed through to the SMB capability untouched
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Context chosen under strict negotiation when the verdict stays unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedFallback {
    /// Offer SMBv2 only and let the caller fall back on failure
    #[default]
    StrictSmb2,

    /// Offer both dialects through the permissive SMBv2 context
    PermissiveSmb2,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
            limit_protocol_negotiation: true,
            permissive_dialect: default_permissive_dialect(),
            unresolved_fallback: UnresolvedFallback::default(),
            properties: BaseProperties::default(),
        }
    }
}

impl Default for BaseProperties {
    fn default() -> Self {
        Self {
            resolve_order: default_resolve_order(),
            ipc_signing_enforced: false,
            disable_plaintext_passwords: false,
            dfs_disabled: true,
            disable_spnego_integrity: false,
            extra: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_permissive_dialect() -> Dialect {
    Dialect::Smb1
}

// Broadcast first so a NetBIOS name that also exists in a foreign DNS zone
// resolves to the local machine.
fn default_resolve_order() -> Vec<String> {
    vec!["BCAST".to_string(), "DNS".to_string()]
}

impl NegotiationConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            NegotiationError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| NegotiationError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
