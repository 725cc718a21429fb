/*!
 * SMB dialect negotiation
 *
 * Decides, per connection, which negotiation context and identity to use:
 * - Four immutable contexts (permissive/strict x SMBv1/SMBv2)
 * - A per-host verdict cache filled lazily by probing
 * - A prober that tries strict SMBv2, then strict SMBv1
 * - A selector that combines the above with the user's strict toggle
 *
 * All collaborators are passed in explicitly. [`NegotiationStack`] wires a
 * complete set from a [`NegotiationConfig`].
 */

pub mod cache;
pub mod context;
pub mod credentials;
pub mod preferences;
pub mod probe;
pub mod selector;

pub use cache::{DialectCache, DialectVerdict};
pub use context::{
    build_context, ContextProperties, ContextProvider, DialectRestriction, NegotiationContext,
    ResolveMethod,
};
pub use credentials::{CredentialResolver, CredentialStore, MemoryCredentialStore};
pub use preferences::{MemoryPreferences, PreferenceStore, TomlPreferences, STRICT_NEGOTIATION_KEY};
pub use probe::DialectProber;
pub use selector::{ConnectionHandle, ConnectionSelector, SelectionPolicy};

use std::sync::Arc;

use crate::config::NegotiationConfig;
use crate::core::DirectoryLister;
use crate::protocols::smb::SmbCapability;

/// Fully wired negotiation layer
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use orbit_dialect::config::NegotiationConfig;
/// use orbit_dialect::negotiation::{MemoryCredentialStore, MemoryPreferences, NegotiationStack};
/// use orbit_dialect::protocols::smb::{Dialect, MockSmbCapability, RemoteEntry};
///
/// let capability = Arc::new(MockSmbCapability::new());
/// capability.serve("nas.local", Dialect::Smb2, vec![RemoteEntry::file("movie.mkv")]);
///
/// let stack = NegotiationStack::new(
///     &NegotiationConfig::default(),
///     Arc::new(MemoryCredentialStore::new()),
///     Arc::new(MemoryPreferences::new()),
///     capability,
/// );
///
/// let entries = stack.lister().list("smb://nas.local/share/").unwrap().unwrap();
/// assert_eq!(entries.len(), 1);
/// ```
#[derive(Debug)]
pub struct NegotiationStack {
    contexts: Arc<ContextProvider>,
    cache: Arc<DialectCache>,
    selector: Arc<ConnectionSelector>,
    lister: DirectoryLister,
}

impl NegotiationStack {
    pub fn new(
        config: &NegotiationConfig,
        credentials: Arc<dyn CredentialStore>,
        preferences: Arc<dyn PreferenceStore>,
        capability: Arc<dyn SmbCapability>,
    ) -> Self {
        let contexts = Arc::new(ContextProvider::new(&config.properties));
        let cache = Arc::new(DialectCache::new());
        let selector = Arc::new(ConnectionSelector::new(
            Arc::clone(&contexts),
            Arc::clone(&cache),
            CredentialResolver::new(credentials),
            preferences,
            capability,
            SelectionPolicy::from(config),
        ));
        let lister = DirectoryLister::new(Arc::clone(&selector));

        Self {
            contexts,
            cache,
            selector,
            lister,
        }
    }

    pub fn contexts(&self) -> &Arc<ContextProvider> {
        &self.contexts
    }

    pub fn cache(&self) -> &Arc<DialectCache> {
        &self.cache
    }

    pub fn selector(&self) -> &Arc<ConnectionSelector> {
        &self.selector
    }

    pub fn lister(&self) -> &DirectoryLister {
        &self.lister
    }
}
