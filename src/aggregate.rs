use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::crawler::PhaseStats;
use crate::store::CandidateStore;
use crate::types::CandidateRecord;

/// Final keyed record set, serialized as one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    pub records: BTreeMap<String, CandidateRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub regions: PhaseStats,
    pub races: PhaseStats,
    pub candidates: PhaseStats,
    /// Records with at least one matching school.
    pub confirmed: usize,
    /// Records carrying the manual review sentinel.
    pub manual_review: usize,
    /// Records removed for having no education facts.
    pub dropped: usize,
}

impl Summary {
    pub fn fetch_errors(&self) -> usize {
        self.regions.errors + self.races.errors + self.candidates.errors
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Regions:       {} ({} ok, {} errors)",
            self.regions.total, self.regions.ok, self.regions.errors
        )?;
        writeln!(
            f,
            "Races:         {} ({} ok, {} errors)",
            self.races.total, self.races.ok, self.races.errors
        )?;
        writeln!(
            f,
            "Candidates:    {} ({} ok, {} errors)",
            self.candidates.total, self.candidates.ok, self.candidates.errors
        )?;
        writeln!(f, "Confirmed:     {}", self.confirmed)?;
        writeln!(f, "Manual review: {}", self.manual_review)?;
        write!(f, "Dropped:       {}", self.dropped)
    }
}

/// Drop records without education facts and count what remains.
/// Sentinel-only records are kept.
pub fn aggregate(store: CandidateStore, summary: &mut Summary) -> Dataset {
    let mut records = store.into_records();
    let before = records.len();
    records.retain(|_, r| !r.education.is_empty());

    summary.dropped = before - records.len();
    summary.manual_review = records
        .values()
        .filter(|r| r.education.is_manual_review())
        .count();
    summary.confirmed = records.len() - summary.manual_review;

    Dataset { records }
}
