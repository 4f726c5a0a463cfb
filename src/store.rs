use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::types::{Biography, CandidateRecord, Sighting};

/// Candidate records keyed by relative URL.
///
/// Only the consumer side of a phase writes here, so merges never race.
#[derive(Debug, Default)]
pub struct CandidateStore {
    records: BTreeMap<String, CandidateRecord>,
    resolved: BTreeSet<String>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sighting: create the candidate on first reference,
    /// overwrite the name, add the race label.
    pub fn note(&mut self, sighting: Sighting) {
        let record = self.records.entry(sighting.url).or_default();
        record.name = Some(sighting.name);
        record.races.insert(sighting.race);
    }

    /// Apply biography facts. Each candidate is resolved once; later
    /// attempts are ignored.
    pub fn resolve(&mut self, url: &str, bio: Biography) {
        if !self.resolved.insert(url.to_string()) {
            warn!(%url, "candidate already resolved, ignoring");
            return;
        }
        let record = self.records.entry(url.to_string()).or_default();
        if bio.party.is_some() {
            record.party = bio.party;
        }
        record.education = bio.education;
    }

    pub fn keys(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn get(&self, url: &str) -> Option<&CandidateRecord> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> BTreeMap<String, CandidateRecord> {
        self.records
    }
}
