//! Dialect probing
//!
//! A probe enumerates the server root with the strict SMBv2 context and, when
//! that fails for any reason other than rejected credentials, with the strict
//! SMBv1 context. Enumeration is used rather than a type query because a type
//! query can succeed over SMBv1 semantics against an SMBv2-only server.
//!
//! Probes never return errors. Concurrent probes of the same host are not
//! coordinated; both run and the later cache write wins.

use std::sync::Arc;

use tracing::{debug, info};

use super::cache::{DialectCache, DialectVerdict};
use super::context::ContextProvider;
use super::credentials::CredentialResolver;
use crate::error::Result;
use crate::protocols::smb::{Dialect, EndpointAddress, NtlmAuth, SmbCapability};

/// Discovers and records which dialect a server speaks
#[derive(Clone)]
pub struct DialectProber {
    cache: Arc<DialectCache>,
    contexts: Arc<ContextProvider>,
    credentials: CredentialResolver,
    capability: Arc<dyn SmbCapability>,
}

impl DialectProber {
    pub fn new(
        cache: Arc<DialectCache>,
        contexts: Arc<ContextProvider>,
        credentials: CredentialResolver,
        capability: Arc<dyn SmbCapability>,
    ) -> Self {
        Self {
            cache,
            contexts,
            credentials,
            capability,
        }
    }

    /// Probe the server hosting `target`. Only host and port are used.
    pub fn probe(&self, target: &EndpointAddress) -> DialectVerdict {
        let root = target.server_root();
        let auth = self.credentials.authenticator(&root);
        debug!(%root, guest = auth.is_guest(), "Probing server dialect");

        match self.enumerate_root(&root, &auth, Dialect::Smb2) {
            Ok(()) => return self.record(&root, Dialect::Smb2),
            Err(e) if e.is_authentication() => {
                debug!(%root, "Credentials rejected while probing, dialect left unknown");
                return DialectVerdict::Unknown;
            }
            Err(e) => {
                debug!(%root, error = %e, "Server did not answer SMBv2, trying SMBv1");
            }
        }

        match self.enumerate_root(&root, &auth, Dialect::Smb1) {
            Ok(()) => self.record(&root, Dialect::Smb1),
            Err(e) => {
                debug!(%root, error = %e, "Server did not answer SMBv1, dialect left unknown");
                DialectVerdict::Unknown
            }
        }
    }

    fn enumerate_root(&self, root: &EndpointAddress, auth: &NtlmAuth, dialect: Dialect) -> Result<()> {
        let context = self.contexts.strict(dialect);
        let session = self.capability.open(root, &context, auth)?;
        session.enumerate()?;
        Ok(())
    }

    fn record(&self, root: &EndpointAddress, dialect: Dialect) -> DialectVerdict {
        let verdict = DialectVerdict::confirmed(dialect);
        info!(host = root.host(), %dialect, "Server dialect identified");
        self.cache.set(root.host(), verdict);
        verdict
    }
}

impl std::fmt::Debug for DialectProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectProber")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::credentials::MemoryCredentialStore;
    use crate::negotiation::DialectRestriction;
    use crate::protocols::smb::{Credential, MockOutcome, MockSmbCapability};

    struct Fixture {
        cache: Arc<DialectCache>,
        capability: Arc<MockSmbCapability>,
        store: Arc<MemoryCredentialStore>,
        prober: DialectProber,
    }

    fn fixture() -> Fixture {
        crate::logging::init_test_logging();
        let cache = Arc::new(DialectCache::new());
        let capability = Arc::new(MockSmbCapability::new());
        let store = Arc::new(MemoryCredentialStore::new());
        let prober = DialectProber::new(
            Arc::clone(&cache),
            Arc::new(ContextProvider::default()),
            CredentialResolver::new(store.clone()),
            capability.clone(),
        );
        Fixture {
            cache,
            capability,
            store,
            prober,
        }
    }

    fn target(s: &str) -> EndpointAddress {
        EndpointAddress::parse(s).unwrap()
    }

    #[test]
    fn test_smb2_server() {
        let f = fixture();
        f.capability.serve("fileserver", Dialect::Smb2, vec![]);

        let verdict = f.prober.probe(&target("smb://fileserver/share/dir"));
        assert_eq!(verdict, DialectVerdict::ConfirmedV2);
        assert_eq!(f.cache.get("fileserver"), DialectVerdict::ConfirmedV2);

        let calls = f.capability.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].address, "smb://fileserver/");
        assert_eq!(calls[0].restriction, DialectRestriction::Strict);
        assert_eq!(calls[0].dialect, Dialect::Smb2);
    }

    #[test]
    fn test_smb1_server() {
        let f = fixture();
        f.capability.serve("nas.local", Dialect::Smb1, vec![]);

        let verdict = f.prober.probe(&target("smb://nas.local/share"));
        assert_eq!(verdict, DialectVerdict::ConfirmedV1);
        assert_eq!(f.cache.get("nas.local"), DialectVerdict::ConfirmedV1);
        assert_eq!(f.cache.writes(), 1);

        let dialects: Vec<_> = f.capability.calls().iter().map(|c| c.dialect).collect();
        assert_eq!(dialects, vec![Dialect::Smb2, Dialect::Smb1]);
    }

    #[test]
    fn test_auth_failure_skips_smb1() {
        let f = fixture();
        f.capability.script("nas.local", Dialect::Smb2, MockOutcome::AuthFailure);
        f.capability.serve("nas.local", Dialect::Smb1, vec![]);

        let verdict = f.prober.probe(&target("smb://nas.local/share"));
        assert_eq!(verdict, DialectVerdict::Unknown);
        assert_eq!(f.capability.open_count(), 1);
        assert!(f.cache.is_empty());
        assert_eq!(f.cache.writes(), 0);
    }

    #[test]
    fn test_unreachable_host_stays_unknown() {
        let f = fixture();
        f.capability.script("ghost", Dialect::Smb2, MockOutcome::Unresolvable);
        f.capability.script("ghost", Dialect::Smb1, MockOutcome::Unresolvable);

        assert_eq!(f.prober.probe(&target("smb://ghost/")), DialectVerdict::Unknown);
        assert_eq!(f.prober.probe(&target("smb://ghost/")), DialectVerdict::Unknown);
        // No negative caching: each probe goes to the network again
        assert_eq!(f.capability.open_count(), 4);
        assert!(f.cache.is_empty());
    }

    #[test]
    fn test_smb1_auth_failure_is_unknown() {
        let f = fixture();
        f.capability.script("nas.local", Dialect::Smb1, MockOutcome::AuthFailure);

        assert_eq!(f.prober.probe(&target("smb://nas.local/")), DialectVerdict::Unknown);
        assert_eq!(f.capability.open_count(), 2);
    }

    #[test]
    fn test_probe_uses_root_credentials() {
        let f = fixture();
        f.store.insert("smb://nas.local/", Credential::new("admin", "pw"));
        f.capability.serve("nas.local", Dialect::Smb2, vec![]);

        f.prober.probe(&target("smb://nas.local/share"));
        let calls = f.capability.calls();
        assert_eq!(calls[0].username, "admin");
        assert_eq!(calls[0].domain, "");
    }

    #[test]
    fn test_probe_falls_back_to_guest() {
        let f = fixture();
        f.store.insert("smb://nas.local/share", Credential::new("jdoe", "pw"));
        f.capability.serve("nas.local", Dialect::Smb2, vec![]);

        f.prober.probe(&target("smb://nas.local/share"));
        assert_eq!(f.capability.calls()[0].username, "GUEST");
    }

    #[test]
    fn test_no_result_set_still_answers() {
        let f = fixture();
        f.capability.script("nas.local", Dialect::Smb2, MockOutcome::NoResultSet);

        assert_eq!(
            f.prober.probe(&target("smb://nas.local/")),
            DialectVerdict::ConfirmedV2
        );
    }
}
