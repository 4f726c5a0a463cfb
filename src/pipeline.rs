use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;
use tracing::info;

use crate::aggregate::{aggregate, Dataset, Summary};
use crate::crawler::{run_phase, PhaseStats, PoolOptions};
use crate::fetch::{Fetch, Site};
use crate::parser::{biography, candidates, races};
use crate::store::CandidateStore;
use crate::types::{RaceRef, RaceStyle, RegionRef};

/// Region pages, then race pages, then candidate pages. Each phase
/// finishes completely before the next one starts.
pub struct Pipeline<F: Fetch> {
    fetcher: Arc<F>,
    site: Arc<Site>,
    school: Arc<Regex>,
    pool: PoolOptions,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F, site: Site, school: Regex, pool: PoolOptions) -> Self {
        Pipeline {
            fetcher: Arc::new(fetcher),
            site: Arc::new(site),
            school: Arc::new(school),
            pool,
        }
    }

    pub async fn discover_races(&self, regions: Vec<RegionRef>) -> (BTreeSet<RaceRef>, PhaseStats) {
        let site = Arc::clone(&self.site);
        let mut found = BTreeSet::new();

        let stats = run_phase(
            "regions",
            Arc::clone(&self.fetcher),
            regions,
            &self.pool,
            move |_: &RegionRef, body: &str| races::discover(body, &site),
            |_, races| found.extend(races),
        )
        .await;

        let votebox = found.iter().filter(|r| r.style == RaceStyle::Votebox).count();
        info!(votebox, table = found.len() - votebox, "race pages discovered");
        (found, stats)
    }

    pub async fn discover_candidates(
        &self,
        races: BTreeSet<RaceRef>,
        store: &mut CandidateStore,
    ) -> PhaseStats {
        let site = Arc::clone(&self.site);

        let stats = run_phase(
            "races",
            Arc::clone(&self.fetcher),
            races.into_iter().collect(),
            &self.pool,
            move |race: &RaceRef, body: &str| candidates::discover(body, race.style, &site),
            |_, sightings| {
                for s in sightings {
                    store.note(s);
                }
            },
        )
        .await;

        info!(candidates = store.len(), "candidates discovered");
        stats
    }

    pub async fn extract_biographies(&self, store: &mut CandidateStore) -> PhaseStats {
        let school = Arc::clone(&self.school);

        run_phase(
            "candidates",
            Arc::clone(&self.fetcher),
            store.keys(),
            &self.pool,
            move |_: &String, body: &str| biography::extract(body, &school),
            |url, bio| store.resolve(&url, bio),
        )
        .await
    }

    pub async fn run(&self, regions: Vec<RegionRef>) -> (Dataset, Summary) {
        let mut summary = Summary::default();
        let mut store = CandidateStore::new();

        let (races, stats) = self.discover_races(regions).await;
        summary.regions = stats;
        summary.races = self.discover_candidates(races, &mut store).await;
        summary.candidates = self.extract_biographies(&mut store).await;

        let dataset = aggregate(store, &mut summary);
        info!(
            confirmed = summary.confirmed,
            manual_review = summary.manual_review,
            dropped = summary.dropped,
            "aggregation finished"
        );
        (dataset, summary)
    }
}
