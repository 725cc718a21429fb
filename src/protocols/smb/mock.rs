//! Scripted SMB capability for tests and embedders
//!
//! Servers are described per host and dialect. Opening never touches the
//! network; the scripted outcome is produced when the session enumerates,
//! the same point where a real client performs negotiation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use super::{Dialect, EndpointAddress, NtlmAuth, RemoteEntry, SmbCapability, SmbSession};
use crate::error::{NegotiationError, Result};
use crate::negotiation::{DialectRestriction, NegotiationContext};

/// What a scripted server does when enumerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Enumeration succeeds with these entries
    Entries(Vec<RemoteEntry>),
    /// Enumeration succeeds but the server returns no result set
    NoResultSet,
    /// Credentials rejected
    AuthFailure,
    /// Dialect not spoken or transport broke
    ProtocolFailure,
    /// Host name cannot be resolved
    Unresolvable,
}

/// One recorded `open` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCall {
    pub address: String,
    pub path: String,
    pub restriction: DialectRestriction,
    pub dialect: Dialect,
    pub username: String,
    pub domain: String,
}

/// In-memory [`SmbCapability`]
#[derive(Debug, Default)]
pub struct MockSmbCapability {
    servers: RwLock<HashMap<(String, Dialect), MockOutcome>>,
    listings: RwLock<HashMap<String, MockOutcome>>,
    calls: Mutex<Vec<OpenCall>>,
    latency: Option<Duration>,
}

impl MockSmbCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every enumeration
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Script the outcome for `host` when negotiated with `dialect`
    pub fn script(&self, host: &str, dialect: Dialect, outcome: MockOutcome) {
        self.servers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((host.to_ascii_lowercase(), dialect), outcome);
    }

    /// Shorthand for a host that speaks `dialect` and lists `entries`
    pub fn serve(&self, host: &str, dialect: Dialect, entries: Vec<RemoteEntry>) {
        self.script(host, dialect, MockOutcome::Entries(entries));
    }

    /// Override what a specific address lists once negotiation succeeded
    pub fn set_listing(&self, address: &str, outcome: MockOutcome) -> Result<()> {
        let key = EndpointAddress::parse(address)?.to_string();
        self.listings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, outcome);
        Ok(())
    }

    /// Every `open` call so far, in order
    pub fn calls(&self) -> Vec<OpenCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `open` calls made against a server root, i.e. probe attempts
    pub fn root_calls(&self) -> Vec<OpenCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == "/")
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn resolve(&self, address: &EndpointAddress, context: &NegotiationContext) -> MockOutcome {
        let servers = self.servers.read().unwrap_or_else(PoisonError::into_inner);
        let offered: Vec<Dialect> = [Dialect::Smb2, Dialect::Smb1]
            .into_iter()
            .filter(|d| context.offers(*d))
            .collect();

        let mut outcome = MockOutcome::ProtocolFailure;
        for dialect in offered {
            match servers.get(&(address.host().to_string(), dialect)) {
                Some(MockOutcome::ProtocolFailure) | None => continue,
                Some(found) => {
                    outcome = found.clone();
                    break;
                }
            }
        }

        if let MockOutcome::Entries(_) | MockOutcome::NoResultSet = outcome {
            if let Some(listing) = self
                .listings
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&address.to_string())
            {
                return listing.clone();
            }
        }
        outcome
    }
}

impl SmbCapability for MockSmbCapability {
    fn open(
        &self,
        address: &EndpointAddress,
        context: &NegotiationContext,
        auth: &NtlmAuth,
    ) -> Result<Box<dyn SmbSession>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OpenCall {
                address: address.to_string(),
                path: address.path().to_string(),
                restriction: context.restriction(),
                dialect: context.dialect(),
                username: auth.username.clone(),
                domain: auth.domain.clone(),
            });

        Ok(Box::new(MockSession {
            address: address.to_string(),
            outcome: self.resolve(address, context),
            latency: self.latency,
        }))
    }
}

struct MockSession {
    address: String,
    outcome: MockOutcome,
    latency: Option<Duration>,
}

impl SmbSession for MockSession {
    fn enumerate(&self) -> Result<Option<Vec<RemoteEntry>>> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        match &self.outcome {
            MockOutcome::Entries(entries) => Ok(Some(entries.clone())),
            MockOutcome::NoResultSet => Ok(None),
            MockOutcome::AuthFailure => Err(NegotiationError::Authentication(self.address.clone())),
            MockOutcome::ProtocolFailure => Err(NegotiationError::Protocol(format!(
                "negotiation failed for {}",
                self.address
            ))),
            MockOutcome::Unresolvable => {
                Err(NegotiationError::AddressResolution(self.address.clone()))
            }
        }
    }
}
