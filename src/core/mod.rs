/*!
 * Core operations built on the negotiation layer
 */

pub mod directory;

pub use directory::{DirEntry, DirectoryLister, EntryType};
