//! SMB capability boundary
//!
//! The wire protocol lives outside this crate. Everything above this module
//! talks to it through [`SmbCapability`] and [`SmbSession`], which a real
//! client library implements and tests replace with [`MockSmbCapability`].
//!
//! # Example
//!
//! ```
//! use orbit_dialect::protocols::smb::{EndpointAddress, MockSmbCapability, RemoteEntry};
//! use orbit_dialect::protocols::smb::Dialect;
//!
//! let capability = MockSmbCapability::new();
//! capability.serve("nas.local", Dialect::Smb2, vec![RemoteEntry::directory("share/")]);
//!
//! let address = EndpointAddress::parse("smb://nas.local/").unwrap();
//! assert_eq!(address.host(), "nas.local");
//! ```

pub mod mock;
pub mod types;
pub mod uri;


pub use mock::{MockOutcome, MockSmbCapability, OpenCall};
pub use types::*;
pub use uri::EndpointAddress;

use crate::error::Result;
use crate::negotiation::NegotiationContext;

/// Opens sessions against a remote SMB resource
///
/// Implementations surface failures as `Authentication`, `Protocol` or
/// `AddressResolution` errors. Timeouts and cancellation are theirs to
/// enforce. Must be safe to call from many threads at once.
pub trait SmbCapability: Send + Sync {
    /// Bind `address` to a negotiation context and identity
    fn open(
        &self,
        address: &EndpointAddress,
        context: &NegotiationContext,
        auth: &NtlmAuth,
    ) -> Result<Box<dyn SmbSession>>;
}

/// An opened remote resource
pub trait SmbSession: Send {
    /// List the immediate children of the resource.
    ///
    /// `Ok(None)` means the server returned no result set at all, which is
    /// different from an empty one.
    fn enumerate(&self) -> Result<Option<Vec<RemoteEntry>>>;
}
