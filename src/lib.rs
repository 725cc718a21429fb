/*!
 * Orbit Dialect - SMB dialect discovery and connection negotiation
 *
 * Sits between share browsing and an SMB client library:
 * - Builds the four negotiation contexts once (permissive/strict x SMBv1/SMBv2)
 * - Probes servers whose dialect is unknown and remembers the verdict
 * - Selects the context and credentials for every connection
 * - Lists one level of a remote path, keeping files and directories only
 *
 * The wire protocol, credential persistence and preference storage are
 * provided by the caller through traits.
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod negotiation;
pub mod protocols;

// Re-export commonly used types
pub use config::{NegotiationConfig, UnresolvedFallback};
pub use core::{DirEntry, DirectoryLister, EntryType};
pub use error::{NegotiationError, Result};
pub use negotiation::{
    ConnectionHandle, ConnectionSelector, DialectCache, DialectVerdict, NegotiationStack,
};
pub use protocols::smb::{Dialect, EndpointAddress};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
