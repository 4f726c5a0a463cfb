use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const UNKNOWN_DEGREE: &str = "Unknown";
pub const MANUAL_REVIEW: &str = "Marked for manual review";

/// Layout of a race results page. Picks the parser in `parser::candidates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RaceStyle {
    /// Boxed vote tallies, one box per race.
    Votebox,
    /// Partisan candidate list with one row per district.
    Table,
}

impl fmt::Display for RaceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceStyle::Votebox => f.write_str("votebox"),
            RaceStyle::Table => f.write_str("table"),
        }
    }
}

/// Relative path of one region's election overview page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionRef(pub String);

impl RegionRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaceRef {
    pub url: String,
    pub style: RaceStyle,
}

/// Anything a phase can fetch.
pub trait Target: Send + Sync + 'static {
    fn path(&self) -> &str;
}

impl Target for RegionRef {
    fn path(&self) -> &str {
        &self.0
    }
}

impl Target for RaceRef {
    fn path(&self) -> &str {
        &self.url
    }
}

impl Target for String {
    fn path(&self) -> &str {
        self
    }
}

/// Education facts for one candidate.
///
/// `Schools` with an empty map means the page was read and nothing matched.
/// `ManualReview` means no education anchor was found at all; it serializes
/// as the single `{"Unknown": "Marked for manual review"}` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Education {
    Schools(BTreeMap<String, String>),
    ManualReview,
}

impl Default for Education {
    fn default() -> Self {
        Education::Schools(BTreeMap::new())
    }
}

impl Education {
    pub fn is_empty(&self) -> bool {
        matches!(self, Education::Schools(s) if s.is_empty())
    }

    pub fn is_manual_review(&self) -> bool {
        matches!(self, Education::ManualReview)
    }
}

impl Serialize for Education {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Education::Schools(schools) => schools.serialize(serializer),
            Education::ManualReview => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNKNOWN_DEGREE, MANUAL_REVIEW)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub races: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    pub education: Education,
}

/// One candidate link found on a race page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub url: String,
    pub name: String,
    pub race: String,
}

/// Outcome of reading one candidate page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Biography {
    pub party: Option<String>,
    pub education: Education,
}
