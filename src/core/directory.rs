/*!
 * One-level listing of remote SMB directories
 */

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::negotiation::ConnectionSelector;
use crate::protocols::smb::RemoteEntry;

/// Type of a listed entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Directory,
    File,
}

/// A file or directory found on a share
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub entry_type: EntryType,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    /// Keep only entries that are definitively a file or a directory
    fn from_remote(entry: RemoteEntry) -> Option<Self> {
        let entry_type = if entry.is_directory() {
            EntryType::Directory
        } else if entry.is_file() {
            EntryType::File
        } else {
            trace!(path = entry.path(), "Dropping entry that is neither file nor directory");
            return None;
        };
        Some(Self {
            path: entry.path().to_string(),
            entry_type,
        })
    }
}

/// Lists the immediate children of remote paths
#[derive(Clone, Debug)]
pub struct DirectoryLister {
    selector: Arc<ConnectionSelector>,
}

impl DirectoryLister {
    pub fn new(selector: Arc<ConnectionSelector>) -> Self {
        Self { selector }
    }

    /// List `endpoint` one level deep.
    ///
    /// Returns `None` when the server produced no result set, and an empty
    /// list when it produced one with nothing but special entries. Address,
    /// authentication and protocol errors are returned unchanged.
    pub fn list(&self, endpoint: &str) -> Result<Option<Vec<DirEntry>>> {
        let handle = self.selector.connect(endpoint)?;
        let entries = match handle.enumerate()? {
            Some(entries) => entries,
            None => return Ok(None),
        };

        Ok(Some(
            entries.into_iter().filter_map(DirEntry::from_remote).collect(),
        ))
    }
}
