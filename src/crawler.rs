use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::fetch::Fetch;
use crate::types::Target;

pub const DEFAULT_CONCURRENCY: usize = 20;

/// Counts for one finished phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    /// Paths whose fetch failed or whose worker aborted.
    pub failed: Vec<String>,
}

/// Knobs shared by every phase.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub concurrency: usize,
    pub progress: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        PoolOptions {
            concurrency: DEFAULT_CONCURRENCY,
            progress: false,
        }
    }
}

fn progress_bar(label: &'static str, total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{prefix:>10} [{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_prefix(label);
    pb
}

/// Fetch and parse every item with at most `opts.concurrency` in flight.
///
/// `parse` runs on the worker right after its fetch, while the permit is
/// still held. Results are handed to `merge` one at a time on the calling
/// task, so `merge` is the only writer of whatever it captures. Returns
/// once every worker has finished.
pub async fn run_phase<F, I, T, P, M>(
    label: &'static str,
    fetcher: Arc<F>,
    items: Vec<I>,
    opts: &PoolOptions,
    parse: P,
    mut merge: M,
) -> PhaseStats
where
    F: Fetch,
    I: Target,
    T: Send + 'static,
    P: Fn(&I, &str) -> T + Send + Sync + 'static,
    M: FnMut(I, T),
{
    let started = Instant::now();
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let parse = Arc::new(parse);
    let pb = progress_bar(label, total, opts.progress);

    info!(phase = label, total, "phase started");

    // Channel: workers send results, this task merges them
    let (tx, mut rx) = mpsc::channel::<(I, Result<T, FetchError>)>(opts.concurrency.max(1) * 2);

    for item in items {
        let fetcher = Arc::clone(&fetcher);
        let sem = Arc::clone(&semaphore);
        let parse = Arc::clone(&parse);
        let tx = tx.clone();

        tokio::spawn(async move {
            // the semaphore is never closed
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let outcome = match fetcher.fetch(item.path()).await {
                Ok(body) => panic::catch_unwind(AssertUnwindSafe(|| parse(&item, &body)))
                    .map_err(|payload| FetchError::Worker {
                        url: item.path().to_string(),
                        reason: panic_reason(payload.as_ref()),
                    }),
                Err(e) => Err(e),
            };
            let _ = tx.send((item, outcome)).await;
        });
    }

    // Drop our copy of tx so rx closes when all workers finish
    drop(tx);

    let mut stats = PhaseStats {
        total,
        ..Default::default()
    };

    while let Some((item, outcome)) = rx.recv().await {
        match outcome {
            Ok(parsed) => {
                stats.ok += 1;
                merge(item, parsed);
            }
            Err(e) => {
                warn!(phase = label, error = %e, "skipping {}", item.path());
                stats.errors += 1;
                stats.failed.push(item.path().to_string());
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        phase = label,
        total = stats.total,
        ok = stats.ok,
        errors = stats.errors,
        secs = started.elapsed().as_secs_f64(),
        "phase finished"
    );
    stats
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_string()
    }
}
