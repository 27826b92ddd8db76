mod calendar;
mod config;
mod dates;
mod fetch;
mod parser;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::{info, warn};

use config::RunConfig;
use fetch::{PageFetcher, PageSource};
use parser::{Layout, RaceRecord};

#[derive(Parser)]
#[command(
    name = "irun_calendar",
    about = "Scrape Greek race calendars into an all-day iCalendar (.ics) file"
)]
struct Cli {
    /// Calendar page to scrape, repeatable (default: irunmag.gr Greece + world marathons for --year)
    #[arg(short, long = "source", value_name = "URL")]
    sources: Vec<String>,
    /// Year for dates that carry none (default: current year)
    #[arg(short, long, env = "IRUN_YEAR")]
    year: Option<i32>,
    /// Output .ics path (default: irun_<year>_calendar.ics)
    #[arg(short, long, env = "IRUN_OUTPUT")]
    output: Option<PathBuf>,
    /// Skip layout probing and use this page structure
    #[arg(long, value_enum)]
    layout: Option<Layout>,
    /// Month to assume when a day range like "25-26/Οκτ" has a non-numeric month (default: drop it)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    fallback_month: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let config = RunConfig::from_cli(Cli::parse());
    info!(
        year = config.dates.year,
        sources = config.sources.len(),
        output = %config.output.display(),
        "Starting run"
    );

    let fetcher = PageFetcher::new()?;
    let harvest = collect_races(&fetcher, &config).await;
    if harvest.succeeded == 0 {
        anyhow::bail!(
            "No source could be scraped ({} of {} failed)",
            harvest.failed,
            config.sources.len()
        );
    }

    let cal = calendar::build_calendar(&config.calendar_name, &harvest.races);
    calendar::write_calendar(&config.output, &cal)?;
    println!(
        "Saved {} races to {}",
        harvest.races.len(),
        config.output.display()
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

/// Races from every source, in source order, plus per-source outcome counts.
struct Harvest {
    races: Vec<RaceRecord>,
    succeeded: usize,
    failed: usize,
}

/// Scrape each source in turn. A failing source is logged and skipped.
async fn collect_races<S: PageSource>(source: &S, config: &RunConfig) -> Harvest {
    let mut harvest = Harvest {
        races: Vec::new(),
        succeeded: 0,
        failed: 0,
    };

    for url in &config.sources {
        match scrape_source(source, url, config).await {
            Ok(races) => {
                println!("Found {} races on {}", races.len(), url);
                harvest.succeeded += 1;
                harvest.races.extend(races);
            }
            Err(e) => {
                warn!("Skipping {}: {:#}", url, e);
                harvest.failed += 1;
            }
        }
    }

    harvest
}

async fn scrape_source<S: PageSource>(
    source: &S,
    url: &str,
    config: &RunConfig,
) -> anyhow::Result<Vec<RaceRecord>> {
    let markup = source.fetch(url).await?;
    let races = parser::process_page(&markup, url, config.layout, &config.dates)?;
    Ok(races)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

// ── Tests ──
