use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::{selector, text_of};
use crate::fetch::Site;
use crate::types::{RaceRef, RaceStyle};

static OFFICES: LazyLock<Selector> = LazyLock::new(|| selector("table#offices"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Office links whose results page uses boxed vote tallies.
pub const VOTEBOX_RACES: &[&str] = &[
    "President of the United States",
    "U.S. Senate",
    "U.S. House",
    "Congress special election",
    "Other state executive",
    "Special state legislative",
];

/// Office links whose results page uses the partisan district table.
pub const TABLE_RACES: &[&str] = &["State Senate", "State House"];

pub fn classify(link_text: &str) -> Option<RaceStyle> {
    if VOTEBOX_RACES.contains(&link_text) {
        Some(RaceStyle::Votebox)
    } else if TABLE_RACES.contains(&link_text) {
        Some(RaceStyle::Table)
    } else {
        None
    }
}

/// Race pages linked from a region's "offices" table.
/// A page without that table yields nothing.
pub fn discover(html: &str, site: &Site) -> BTreeSet<RaceRef> {
    let doc = Html::parse_document(html);
    let mut races = BTreeSet::new();

    let Some(offices) = doc.select(&OFFICES).next() else {
        debug!("no offices table");
        return races;
    };

    for a in offices.select(&LINK) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if let Some(style) = classify(&text_of(a)) {
            races.insert(RaceRef {
                url: site.normalize(href),
                style,
            });
        }
    }

    races
}
