//! Negotiation contexts
//!
//! A context fixes which dialects are offered when a connection is set up.
//! Exactly four exist per [`ContextProvider`]: permissive and strict, for each
//! of SMBv1 and SMBv2. They are built once and shared read-only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::BaseProperties;
use crate::error::{NegotiationError, Result};
use crate::protocols::smb::Dialect;

/// How many dialects a context is allowed to negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectRestriction {
    /// Dual-dialect negotiation where the library permits it
    Permissive,
    /// Exactly one dialect
    Strict,
}

/// Name resolution mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMethod {
    Bcast,
    Dns,
    Wins,
    Lmhosts,
}

impl FromStr for ResolveMethod {
    type Err = NegotiationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BCAST" => Ok(ResolveMethod::Bcast),
            "DNS" => Ok(ResolveMethod::Dns),
            "WINS" => Ok(ResolveMethod::Wins),
            "LMHOSTS" => Ok(ResolveMethod::Lmhosts),
            other => Err(NegotiationError::ConfigurationBuild(format!(
                "unknown resolve method '{}'",
                other
            ))),
        }
    }
}

/// Concrete property set handed to the SMB capability
///
/// `Default` is the empty configuration: no shared properties at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextProperties {
    pub smb1_disabled: bool,
    pub smb2_enabled: bool,
    /// Open with an SMB2 negotiate request instead of the SMB1 multi-protocol one
    pub smb2_negotiation: bool,
    pub resolve_order: Vec<ResolveMethod>,
    pub ipc_signing_enforced: bool,
    pub plaintext_passwords_disabled: bool,
    pub dfs_disabled: bool,
    pub spnego_integrity_disabled: bool,
    pub extra: BTreeMap<String, String>,
}

impl ContextProperties {
    /// Validate and convert the configured shared properties
    pub fn from_base(base: &BaseProperties) -> Result<Self> {
        if base.resolve_order.is_empty() {
            return Err(NegotiationError::ConfigurationBuild(
                "resolve order is empty".to_string(),
            ));
        }
        let resolve_order = base
            .resolve_order
            .iter()
            .map(|m| m.parse())
            .collect::<Result<Vec<_>>>()?;

        if let Some(key) = base.extra.keys().find(|k| k.trim().is_empty()) {
            return Err(NegotiationError::ConfigurationBuild(format!(
                "blank property name {:?}",
                key
            )));
        }

        Ok(Self {
            resolve_order,
            ipc_signing_enforced: base.ipc_signing_enforced,
            plaintext_passwords_disabled: base.disable_plaintext_passwords,
            dfs_disabled: base.dfs_disabled,
            spnego_integrity_disabled: base.disable_spnego_integrity,
            extra: base.extra.clone(),
            ..Self::default()
        })
    }

    /// Apply the dialect switches for one of the four contexts.
    ///
    /// Permissive contexts keep SMB1-style negotiation so SMBv1-only servers
    /// still answer; strict SMBv2 switches it off entirely.
    pub fn with_dialect_policy(mut self, restriction: DialectRestriction, dialect: Dialect) -> Self {
        let (smb1_disabled, smb2_enabled, smb2_negotiation) = match (restriction, dialect) {
            (DialectRestriction::Strict, Dialect::Smb2) => (true, true, true),
            (_, Dialect::Smb2) => (false, true, false),
            (_, Dialect::Smb1) => (false, false, false),
        };
        self.smb1_disabled = smb1_disabled;
        self.smb2_enabled = smb2_enabled;
        self.smb2_negotiation = smb2_negotiation;
        self
    }

    pub fn offers(&self, dialect: Dialect) -> bool {
        match dialect {
            Dialect::Smb1 => !self.smb1_disabled,
            Dialect::Smb2 => self.smb2_enabled,
        }
    }
}

/// Immutable negotiation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationContext {
    restriction: DialectRestriction,
    dialect: Dialect,
    properties: ContextProperties,
    fallback: bool,
}

impl NegotiationContext {
    pub fn restriction(&self) -> DialectRestriction {
        self.restriction
    }

    /// Preferred dialect; the only one offered when strict
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_strict(&self) -> bool {
        self.restriction == DialectRestriction::Strict
    }

    pub fn properties(&self) -> &ContextProperties {
        &self.properties
    }

    pub fn offers(&self, dialect: Dialect) -> bool {
        self.properties.offers(dialect)
    }

    /// True when the configured properties were rejected and the empty
    /// configuration is in use
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

impl fmt::Display for NegotiationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let restriction = match self.restriction {
            DialectRestriction::Permissive => "permissive",
            DialectRestriction::Strict => "strict",
        };
        let dialect = match self.dialect {
            Dialect::Smb1 => "smb1",
            Dialect::Smb2 => "smb2",
        };
        write!(f, "{}-{}", restriction, dialect)
    }
}

/// Build one negotiation context. Never fails: a property set that does not
/// validate is replaced by the empty configuration and logged.
pub fn build_context(strict: bool, dialect: Dialect, base: &BaseProperties) -> NegotiationContext {
    let restriction = if strict {
        DialectRestriction::Strict
    } else {
        DialectRestriction::Permissive
    };

    match ContextProperties::from_base(base) {
        Ok(properties) => NegotiationContext {
            restriction,
            dialect,
            properties: properties.with_dialect_policy(restriction, dialect),
            fallback: false,
        },
        Err(e) => {
            warn!(
                ?restriction,
                %dialect,
                error = %e,
                "Negotiation properties rejected, using empty configuration"
            );
            NegotiationContext {
                restriction,
                dialect,
                properties: ContextProperties::default().with_dialect_policy(restriction, dialect),
                fallback: true,
            }
        }
    }
}

/// Owner of the four negotiation contexts
#[derive(Debug, Clone)]
pub struct ContextProvider {
    permissive_smb1: Arc<NegotiationContext>,
    permissive_smb2: Arc<NegotiationContext>,
    strict_smb1: Arc<NegotiationContext>,
    strict_smb2: Arc<NegotiationContext>,
}

impl ContextProvider {
    /// Build all four contexts up front
    pub fn new(base: &BaseProperties) -> Self {
        let provider = Self {
            permissive_smb1: Arc::new(build_context(false, Dialect::Smb1, base)),
            permissive_smb2: Arc::new(build_context(false, Dialect::Smb2, base)),
            strict_smb1: Arc::new(build_context(true, Dialect::Smb1, base)),
            strict_smb2: Arc::new(build_context(true, Dialect::Smb2, base)),
        };
        debug!(
            fallback = provider.strict_smb2.is_fallback(),
            "Negotiation contexts ready"
        );
        provider
    }

    pub fn get(&self, restriction: DialectRestriction, dialect: Dialect) -> Arc<NegotiationContext> {
        let context = match (restriction, dialect) {
            (DialectRestriction::Permissive, Dialect::Smb1) => &self.permissive_smb1,
            (DialectRestriction::Permissive, Dialect::Smb2) => &self.permissive_smb2,
            (DialectRestriction::Strict, Dialect::Smb1) => &self.strict_smb1,
            (DialectRestriction::Strict, Dialect::Smb2) => &self.strict_smb2,
        };
        Arc::clone(context)
    }

    pub fn permissive(&self, dialect: Dialect) -> Arc<NegotiationContext> {
        self.get(DialectRestriction::Permissive, dialect)
    }

    pub fn strict(&self, dialect: Dialect) -> Arc<NegotiationContext> {
        self.get(DialectRestriction::Strict, dialect)
    }
}

impl Default for ContextProvider {
    fn default() -> Self {
        Self::new(&BaseProperties::default())
    }
}
