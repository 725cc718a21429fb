//! Connection selection
//!
//! Chooses the negotiation context and identity for every connection. Under
//! strict negotiation the server's dialect verdict decides the context,
//! probing first when the verdict is unknown. Otherwise the configured
//! permissive context is used and the cache is never consulted.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::cache::{DialectCache, DialectVerdict};
use super::context::{ContextProvider, NegotiationContext};
use super::credentials::CredentialResolver;
use super::preferences::{PreferenceStore, STRICT_NEGOTIATION_KEY};
use super::probe::DialectProber;
use crate::config::{NegotiationConfig, UnresolvedFallback};
use crate::error::Result;
use crate::protocols::smb::{
    Dialect, EndpointAddress, NtlmAuth, RemoteEntry, SmbCapability, SmbSession,
};

/// Selection knobs taken from [`NegotiationConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub limit_protocol_negotiation: bool,
    pub permissive_dialect: Dialect,
    pub unresolved_fallback: UnresolvedFallback,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from(&NegotiationConfig::default())
    }
}

impl From<&NegotiationConfig> for SelectionPolicy {
    fn from(config: &NegotiationConfig) -> Self {
        Self {
            limit_protocol_negotiation: config.limit_protocol_negotiation,
            permissive_dialect: config.permissive_dialect,
            unresolved_fallback: config.unresolved_fallback,
        }
    }
}

/// A target bound to a negotiation context and identity
///
/// Built fresh for every request and owned by the caller. Nothing touches
/// the network until [`ConnectionHandle::open`] or
/// [`ConnectionHandle::enumerate`] is called, and failures there are returned
/// as-is; the handle does not retry with another context.
#[derive(Clone)]
pub struct ConnectionHandle {
    address: EndpointAddress,
    context: Arc<NegotiationContext>,
    auth: NtlmAuth,
    capability: Arc<dyn SmbCapability>,
}

impl ConnectionHandle {
    pub fn address(&self) -> &EndpointAddress {
        &self.address
    }

    pub fn context(&self) -> &NegotiationContext {
        &self.context
    }

    pub fn auth(&self) -> &NtlmAuth {
        &self.auth
    }

    pub fn open(&self) -> Result<Box<dyn SmbSession>> {
        self.capability.open(&self.address, &self.context, &self.auth)
    }

    /// One-level enumeration of the bound address
    pub fn enumerate(&self) -> Result<Option<Vec<RemoteEntry>>> {
        self.open()?.enumerate()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("address", &self.address.to_string())
            .field("context", &self.context.to_string())
            .field("username", &self.auth.username)
            .finish()
    }
}

/// Picks the context and credentials for each connection
pub struct ConnectionSelector {
    contexts: Arc<ContextProvider>,
    cache: Arc<DialectCache>,
    credentials: CredentialResolver,
    preferences: Arc<dyn PreferenceStore>,
    capability: Arc<dyn SmbCapability>,
    prober: DialectProber,
    policy: SelectionPolicy,
}

impl ConnectionSelector {
    pub fn new(
        contexts: Arc<ContextProvider>,
        cache: Arc<DialectCache>,
        credentials: CredentialResolver,
        preferences: Arc<dyn PreferenceStore>,
        capability: Arc<dyn SmbCapability>,
        policy: SelectionPolicy,
    ) -> Self {
        let prober = DialectProber::new(
            Arc::clone(&cache),
            Arc::clone(&contexts),
            credentials.clone(),
            Arc::clone(&capability),
        );
        Self {
            contexts,
            cache,
            credentials,
            preferences,
            capability,
            prober,
            policy,
        }
    }

    pub fn cache(&self) -> &Arc<DialectCache> {
        &self.cache
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    fn toggle(&self) -> bool {
        self.preferences.get_bool(STRICT_NEGOTIATION_KEY, false)
    }

    /// Current strict negotiation setting, read fresh from the preference store
    pub fn strict_policy(&self) -> bool {
        self.policy.limit_protocol_negotiation && self.toggle()
    }

    /// Dialect of the permissive context used when strict negotiation is off.
    ///
    /// With `limit_protocol_negotiation` disabled the user toggle selects
    /// permissive SMBv2 instead of restricting the dialect.
    pub fn permissive_dialect(&self) -> Dialect {
        if !self.policy.limit_protocol_negotiation && self.toggle() {
            Dialect::Smb2
        } else {
            self.policy.permissive_dialect
        }
    }

    /// Select a handle for `endpoint` using the user's current preference
    pub fn connect(&self, endpoint: &str) -> Result<ConnectionHandle> {
        self.select(endpoint, self.strict_policy())
    }

    /// Select a handle for `endpoint` under an explicit strict setting.
    ///
    /// Fails only with `InvalidAddress`; under strict negotiation an unknown
    /// host is probed synchronously before returning.
    pub fn select(&self, endpoint: &str, strict: bool) -> Result<ConnectionHandle> {
        let address = EndpointAddress::parse(endpoint)?;
        Ok(self.select_address(address, strict))
    }

    pub fn select_address(&self, address: EndpointAddress, strict: bool) -> ConnectionHandle {
        let context = if strict {
            self.strict_context(&address)
        } else {
            let dialect = self.permissive_dialect();
            trace!(%address, %dialect, "Strict negotiation off");
            self.contexts.permissive(dialect)
        };
        let auth = self.credentials.authenticator(&address);
        debug!(%address, context = %context, guest = auth.is_guest(), "Connection selected");

        ConnectionHandle {
            address,
            context,
            auth,
            capability: Arc::clone(&self.capability),
        }
    }

    fn strict_context(&self, address: &EndpointAddress) -> Arc<NegotiationContext> {
        let mut verdict = self.cache.get(address.host());
        if verdict == DialectVerdict::Unknown {
            verdict = self.prober.probe(address);
        } else {
            trace!(host = address.host(), ?verdict, "Dialect verdict cached");
        }

        match verdict.dialect() {
            Some(dialect) => self.contexts.strict(dialect),
            None => {
                debug!(
                    host = address.host(),
                    fallback = ?self.policy.unresolved_fallback,
                    "Server dialect unknown, using fallback context"
                );
                match self.policy.unresolved_fallback {
                    UnresolvedFallback::StrictSmb2 => self.contexts.strict(Dialect::Smb2),
                    UnresolvedFallback::PermissiveSmb2 => self.contexts.permissive(Dialect::Smb2),
                }
            }
        }
    }
}

impl fmt::Debug for ConnectionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSelector")
            .field("policy", &self.policy)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
