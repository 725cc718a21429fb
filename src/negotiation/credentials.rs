//! Credential lookup for SMB endpoints

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::protocols::smb::{Credential, EndpointAddress, NtlmAuth};

/// External credential store, keyed by normalized endpoint address
/// (`smb://host/share/...`). Must not block indefinitely.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, address: &str) -> Option<Credential>;
}

/// Thread-safe in-memory credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential for an address, normalizing it first when possible
    pub fn insert(&self, address: &str, credential: Credential) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_key(address), credential);
    }

    /// Forget the credential for an address, normalized the same way as `insert`
    pub fn remove(&self, address: &str) -> Option<Credential> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize_key(address))
    }
}

fn normalize_key(address: &str) -> String {
    EndpointAddress::parse(address)
        .map(|a| a.to_string())
        .unwrap_or_else(|_| address.to_string())
}

impl CredentialStore for MemoryCredentialStore {
    fn lookup(&self, address: &str) -> Option<Credential> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }
}

/// Resolves the identity to present for an endpoint
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Stored credential for the exact address, if any
    pub fn resolve(&self, address: &EndpointAddress) -> Option<Credential> {
        self.store.lookup(&address.to_string())
    }

    /// NTLM identity for the address: the stored credential with an empty
    /// domain, or the guest identity when nothing is stored
    pub fn authenticator(&self, address: &EndpointAddress) -> NtlmAuth {
        match self.resolve(address) {
            Some(credential) => NtlmAuth::from_credential(credential),
            None => {
                trace!(%address, "No stored credential, using guest identity");
                NtlmAuth::guest()
            }
        }
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(store: MemoryCredentialStore) -> CredentialResolver {
        CredentialResolver::new(Arc::new(store))
    }

    #[test]
    fn test_missing_credential_is_guest() {
        let resolver = resolver_with(MemoryCredentialStore::new());
        let address = EndpointAddress::parse("smb://nas.local/share").unwrap();

        assert!(resolver.resolve(&address).is_none());

        let auth = resolver.authenticator(&address);
        assert_eq!(auth.username, "GUEST");
        assert_eq!(auth.domain, "");
        assert_eq!(auth.password.expose(), "");
    }

    #[test]
    fn test_stored_credential() {
        let store = MemoryCredentialStore::new();
        store.insert("smb://nas.local/share", Credential::new("jdoe", "pw"));
        let resolver = resolver_with(store);

        let address = EndpointAddress::parse("smb://NAS.local/share").unwrap();
        let auth = resolver.authenticator(&address);
        assert_eq!(auth.username, "jdoe");
        assert_eq!(auth.password.expose(), "pw");
        assert_eq!(auth.domain, "");
    }

    #[test]
    fn test_lookup_is_exact_address() {
        let store = MemoryCredentialStore::new();
        store.insert("smb://nas.local/share", Credential::new("jdoe", "pw"));
        let resolver = resolver_with(store);

        let root = EndpointAddress::parse("smb://nas.local/").unwrap();
        assert!(resolver.resolve(&root).is_none());
        assert!(resolver.authenticator(&root).is_guest());
    }

    #[test]
    fn test_remove() {
        let store = MemoryCredentialStore::new();
        store.insert("smb://nas.local/", Credential::new("jdoe", "pw"));
        assert!(store.remove("smb://nas.local/").is_some());
        assert!(store.lookup("smb://nas.local/").is_none());
    }

    #[test]
    fn test_remove_matches_insert_normalization() {
        let store = MemoryCredentialStore::new();
        store.insert("smb://NAS.local/share", Credential::new("jdoe", "pw"));
        store.insert("cifs://fileserver/data", Credential::new("ops", "pw"));

        let removed = store.remove("smb://NAS.local/share").unwrap();
        assert_eq!(removed.username, "jdoe");
        assert!(store.lookup("smb://nas.local/share").is_none());

        assert!(store.remove("cifs://FileServer/data").is_some());
        assert!(store.lookup("smb://fileserver/data").is_none());

        let resolver = resolver_with(store);
        let address = EndpointAddress::parse("smb://nas.local/share").unwrap();
        assert!(resolver.authenticator(&address).is_guest());
    }
}
