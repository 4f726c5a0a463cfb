use anyhow::{bail, Result};

use crate::types::RegionRef;

pub const REGIONS: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

/// Election overview path for one region, e.g. `North_Carolina_elections,_2020`.
pub fn region_ref(name: &str, year: u16) -> RegionRef {
    RegionRef(format!("{}_elections,_{}", name.replace(' ', "_"), year))
}

pub fn enumerate(year: u16) -> Vec<RegionRef> {
    REGIONS.iter().map(|name| region_ref(name, year)).collect()
}

/// Like `enumerate` but limited to `names`. Matching ignores case and
/// accepts underscores for spaces. An empty selection means every region.
pub fn enumerate_only(names: &[String], year: u16) -> Result<Vec<RegionRef>> {
    if names.is_empty() {
        return Ok(enumerate(year));
    }

    let mut refs = Vec::with_capacity(names.len());
    for wanted in names {
        let wanted = wanted.trim().replace('_', " ");
        match REGIONS.iter().find(|r| r.eq_ignore_ascii_case(&wanted)) {
            Some(name) => {
                let r = region_ref(name, year);
                if !refs.contains(&r) {
                    refs.push(r);
                }
            }
            None => bail!("unknown region {:?}", wanted),
        }
    }
    Ok(refs)
}
