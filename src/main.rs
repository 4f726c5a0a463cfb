use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use alum_crawler::config::Settings;
use alum_crawler::fetch::HttpFetcher;
use alum_crawler::pipeline::Pipeline;
use alum_crawler::regions;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "alum_crawler", about = "Find election candidates who attended a given school")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl regions, races and candidates and write the JSON dataset
    Run {
        /// Election year
        #[arg(short, long)]
        year: Option<u16>,
        /// Region to crawl (repeatable; default: all)
        #[arg(short, long = "region")]
        regions: Vec<String>,
        /// Regex a school name must match
        #[arg(short, long)]
        school: Option<String>,
        /// Max concurrent fetches per phase
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
        /// Hide progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// List the region pages that would be crawled
    Regions {
        #[arg(short, long)]
        year: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Regions { year } => {
            let year = year.unwrap_or(settings.year);
            for r in regions::enumerate_only(&settings.regions, year)? {
                println!("{}", r.as_str());
            }
            Ok(())
        }
        Commands::Run {
            year,
            regions: region_names,
            school,
            concurrency,
            output,
            pretty,
            no_progress,
        } => {
            if let Some(year) = year {
                settings.year = year;
            }
            if !region_names.is_empty() {
                settings.regions = region_names;
            }
            if let Some(school) = school {
                settings.school_pattern = school;
            }
            if let Some(n) = concurrency {
                settings.max_concurrency = n;
            }
            if no_progress {
                settings.progress = false;
            }
            settings.validate()?;
            info!(?settings, "Starting crawl");

            let targets = regions::enumerate_only(&settings.regions, settings.year)?;
            let fetcher = HttpFetcher::new(settings.site()?, settings.timeout())?;
            let pipeline = Pipeline::new(fetcher, settings.site()?, settings.school()?, settings.pool());

            let (dataset, summary) = pipeline.run(targets).await;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_json(BufWriter::new(file), &dataset, pretty)?;
                    eprintln!("Wrote {} candidates to {}", dataset.records.len(), path.display());
                }
                None => write_json(io::stdout().lock(), &dataset, pretty)?,
            }

            eprintln!("\n{}", summary);
            if summary.fetch_errors() > 0 {
                eprintln!("{} pages could not be fetched", summary.fetch_errors());
            }
            eprintln!("Done in {}", format_duration(t0.elapsed()));
            Ok(())
        }
    }
}

fn write_json<W: Write, T: serde::Serialize>(mut out: W, value: &T, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    out.flush().context("Failed to write output")?;
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
