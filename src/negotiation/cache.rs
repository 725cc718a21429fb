//! Per-host dialect verdicts
//!
//! Entries live for the lifetime of the cache. Hosts seen by a client are few
//! and their dialect support does not change at runtime, so nothing is evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use crate::protocols::smb::Dialect;

/// What is known about a server's dialect support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialectVerdict {
    /// Never probed, or probing was inconclusive
    #[default]
    Unknown,
    /// Server answered a strict SMBv1 enumeration
    ConfirmedV1,
    /// Server answered a strict SMBv2 enumeration
    ConfirmedV2,
}

impl DialectVerdict {
    pub fn confirmed(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Smb1 => DialectVerdict::ConfirmedV1,
            Dialect::Smb2 => DialectVerdict::ConfirmedV2,
        }
    }

    /// Confirmed dialect, if any
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            DialectVerdict::Unknown => None,
            DialectVerdict::ConfirmedV1 => Some(Dialect::Smb1),
            DialectVerdict::ConfirmedV2 => Some(Dialect::Smb2),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DialectVerdict::Unknown)
    }
}

/// Thread-safe host → verdict map
#[derive(Debug, Default)]
pub struct DialectCache {
    verdicts: RwLock<HashMap<String, DialectVerdict>>,
    writes: AtomicUsize,
}

impl DialectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdict for `host`, `Unknown` when absent
    pub fn get(&self, host: &str) -> DialectVerdict {
        self.verdicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .copied()
            .unwrap_or_default()
    }

    /// Record a confirmed verdict for `host`, last write wins.
    ///
    /// Setting `Unknown` is a no-op: nothing is stored, an existing verdict
    /// is left in place and [`DialectCache::writes`] does not move.
    pub fn set(&self, host: &str, verdict: DialectVerdict) {
        if !verdict.is_known() {
            return;
        }
        self.writes.fetch_add(1, Ordering::Relaxed);

        let previous = self
            .verdicts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.to_string(), verdict);

        match previous {
            Some(old) if old != verdict => {
                warn!(host, ?old, new = ?verdict, "Dialect verdict changed");
            }
            Some(_) => {}
            None => debug!(host, ?verdict, "Dialect verdict recorded"),
        }
    }

    /// Number of verdicts stored since the cache was created
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.verdicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All recorded verdicts, sorted by host
    pub fn snapshot(&self) -> Vec<(String, DialectVerdict)> {
        let mut entries: Vec<_> = self
            .verdicts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(host, verdict)| (host.clone(), *verdict))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
