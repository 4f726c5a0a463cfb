use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::{Config, Environment};
use regex::Regex;
use serde::Deserialize;

use crate::crawler::{PoolOptions, DEFAULT_CONCURRENCY};
use crate::fetch::Site;

pub const DEFAULT_BASE_URL: &str = "https://ballotpedia.org/";
pub const DEFAULT_YEAR: u16 = 2020;
pub const DEFAULT_SCHOOL: &str = "Duke";

/// Run settings. Defaults, then `ALUM_*` environment variables, then CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub year: u16,
    /// Region names to crawl; empty means all.
    pub regions: Vec<String>,
    pub school_pattern: String,
    pub max_concurrency: usize,
    pub timeout_secs: Option<u64>,
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            year: DEFAULT_YEAR,
            regions: Vec::new(),
            school_pattern: DEFAULT_SCHOOL.to_string(),
            max_concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: None,
            progress: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix("ALUM")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("regions"),
            )
            .build()
            .context("Failed to read ALUM_* environment")?
            .try_deserialize::<Settings>()
            .context("Invalid ALUM_* settings")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_concurrency >= 1, "max_concurrency must be at least 1");
        self.school()?;
        self.site()?;
        Ok(())
    }

    pub fn school(&self) -> Result<Regex> {
        Regex::new(&self.school_pattern)
            .with_context(|| format!("invalid school pattern {:?}", self.school_pattern))
    }

    pub fn site(&self) -> Result<Site> {
        Site::new(&self.base_url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn pool(&self) -> PoolOptions {
        PoolOptions {
            concurrency: self.max_concurrency,
            progress: self.progress,
        }
    }
}
