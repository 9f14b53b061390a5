//! Snapshot Cache
//!
//! Write-through store of the latest [`DomainSnapshot`] per domain, shared
//! between the collection loop (writer) and scrape handling (reader).
//!
//! - Snapshots are stored as `Arc`s and replaced wholesale, so a reader
//!   either sees the previous snapshot or the new one, never a mix.
//! - Locks are only held for a map lookup or insert, never across I/O.
//! - A domain's snapshot and its last outcome share one map entry, so a
//!   reader never pairs a new snapshot with a stale outcome.
//! - Entries never expire. A failed collection only updates the outcome
//!   bookkeeping and leaves the last good snapshot in place.

use crate::error::{ExporterError, Result};
use crate::snapshot::{CollectionOutcome, Domain, DomainSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Everything cached for one domain, always read and written together
#[derive(Debug, Clone)]
pub struct CachedDomain {
    /// Last successful snapshot, if any collection ever succeeded
    pub snapshot: Option<Arc<DomainSnapshot>>,
    /// Most recent attempt, successful or not
    pub outcome: CollectionOutcome,
}

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<Domain, CachedDomain>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a successful collection, replacing any previous snapshot
    pub fn put(&self, domain: Domain, snapshot: DomainSnapshot) {
        debug_assert_eq!(snapshot.domain(), domain, "snapshot stored under the wrong domain");

        let entry = CachedDomain {
            outcome: CollectionOutcome {
                success: true,
                duration_seconds: snapshot.collection_duration_seconds,
            },
            snapshot: Some(Arc::new(snapshot)),
        };

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain, entry);
    }

    /// Records a failed collection without touching the cached snapshot
    pub fn record_failure(&self, domain: Domain, duration_seconds: f64) {
        let outcome = CollectionOutcome {
            success: false,
            duration_seconds,
        };

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(domain)
            .and_modify(|entry| entry.outcome = outcome)
            .or_insert(CachedDomain {
                snapshot: None,
                outcome,
            });
    }

    /// Snapshot and outcome of a domain from a single read
    pub fn entry(&self, domain: Domain) -> Option<CachedDomain> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&domain)
            .cloned()
    }

    /// Latest successful snapshot of a domain
    pub fn get(&self, domain: Domain) -> Result<Arc<DomainSnapshot>> {
        self.entry(domain)
            .and_then(|entry| entry.snapshot)
            .ok_or(ExporterError::SnapshotNotFound(domain))
    }

    /// Outcome of the most recent collection attempt, if any
    pub fn outcome(&self, domain: Domain) -> Option<CollectionOutcome> {
        self.entry(domain).map(|entry| entry.outcome)
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.entry(domain)
            .is_some_and(|entry| entry.snapshot.is_some())
    }
}
