use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Url;
use tracing::debug;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("alum_crawler/", env!("CARGO_PKG_VERSION"));

/// Retrieve one document by site-relative path or absolute URL.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Site prefix used to resolve relative paths and to canonicalize link targets.
#[derive(Debug, Clone)]
pub struct Site {
    prefix: String,
    strip: Regex,
}

impl Site {
    pub fn new(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("invalid base url {base_url:?}"))?;
        let host = url
            .host_str()
            .with_context(|| format!("base url {base_url:?} has no host"))?;
        let strip = Regex::new(&format!(r"^(?:https?://)?(?:{})?/", regex::escape(host)))?;

        let mut prefix = base_url.to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Ok(Site { prefix, strip })
    }

    /// Canonical relative key for a link target: no scheme, no host, no leading slash.
    pub fn normalize(&self, href: &str) -> String {
        self.strip.replace(href.trim(), "").into_owned()
    }

    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.prefix, path.trim_start_matches('/'))
        }
    }
}

/// `Fetch` over HTTP with one shared connection pool.
pub struct HttpFetcher {
    client: reqwest::Client,
    site: Site,
}

impl HttpFetcher {
    pub fn new(site: Site, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client, site })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = self.site.resolve(path);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Body {
                url: url.clone(),
                source,
            })?;

        debug!(%url, latency_ms = start.elapsed().as_millis() as u64, bytes = body.len(), "fetched");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site::new("https://ballotpedia.org/").unwrap()
    }

    #[test]
    fn normalize_strips_scheme_host_and_slash() {
        let s = site();
        assert_eq!(s.normalize("https://ballotpedia.org/Jane_Doe"), "Jane_Doe");
        assert_eq!(s.normalize("http://ballotpedia.org/Jane_Doe"), "Jane_Doe");
        assert_eq!(s.normalize("ballotpedia.org/Jane_Doe"), "Jane_Doe");
        assert_eq!(s.normalize("/Jane_Doe"), "Jane_Doe");
        assert_eq!(s.normalize("Jane_Doe"), "Jane_Doe");
    }

    #[test]
    fn normalize_leaves_foreign_hosts() {
        assert_eq!(
            site().normalize("https://example.com/Jane_Doe"),
            "https://example.com/Jane_Doe"
        );
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let s = Site::new("https://ballotpedia.org").unwrap();
        assert_eq!(s.resolve("Jane_Doe"), "https://ballotpedia.org/Jane_Doe");
        assert_eq!(s.resolve("/Jane_Doe"), "https://ballotpedia.org/Jane_Doe");
        assert_eq!(s.resolve("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(Site::new("not a url").is_err());
    }
}
