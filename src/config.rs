use std::path::PathBuf;

use chrono::Datelike;

use crate::dates::{DateContext, MonthFallback};
use crate::parser::Layout;
use crate::Cli;

/// Pages scraped when no `--source` is given; `{year}` is filled in per run.
const DEFAULT_SOURCES: &[&str] = &[
    "https://irunmag.gr/races/calendar/greece-{year}",
    "https://irunmag.gr/races/world-race/world-marathons-{year}",
];

/// Everything one run needs, resolved from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sources: Vec<String>,
    pub output: PathBuf,
    pub layout: Option<Layout>,
    pub dates: DateContext,
    pub calendar_name: String,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let year = cli.year.unwrap_or_else(|| chrono::Local::now().year());

        let sources = if cli.sources.is_empty() {
            default_sources(year)
        } else {
            cli.sources
        };

        let output = cli
            .output
            .unwrap_or_else(|| PathBuf::from(format!("irun_{}_calendar.ics", year)));

        let month_fallback = match cli.fallback_month {
            Some(month) => MonthFallback::Substitute(month),
            None => MonthFallback::Reject,
        };

        Self {
            sources,
            output,
            layout: cli.layout,
            dates: DateContext {
                year,
                month_fallback,
            },
            calendar_name: format!("iRun races {}", year),
        }
    }
}

pub fn default_sources(year: i32) -> Vec<String> {
    DEFAULT_SOURCES
        .iter()
        .map(|s| s.replace("{year}", &year.to_string()))
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> RunConfig {
        let argv = std::iter::once("irun_calendar").chain(args.iter().copied());
        RunConfig::from_cli(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn defaults_follow_year() {
        let c = config(&["--year", "2025"]);
        assert_eq!(
            c.sources,
            vec![
                "https://irunmag.gr/races/calendar/greece-2025",
                "https://irunmag.gr/races/world-race/world-marathons-2025",
            ]
        );
        assert_eq!(c.output, PathBuf::from("irun_2025_calendar.ics"));
        assert_eq!(c.dates.year, 2025);
        assert_eq!(c.dates.month_fallback, MonthFallback::Reject);
        assert_eq!(c.layout, None);
    }

    #[test]
    fn explicit_sources_replace_defaults() {
        let c = config(&[
            "-y",
            "2026",
            "-s",
            "https://a.example/cal",
            "--source",
            "https://b.example/cal",
            "-o",
            "docs/races.ics",
            "--layout",
            "flat-list",
        ]);
        assert_eq!(c.sources, vec!["https://a.example/cal", "https://b.example/cal"]);
        assert_eq!(c.output, PathBuf::from("docs/races.ics"));
        assert_eq!(c.layout, Some(Layout::FlatList));
    }

    #[test]
    fn fallback_month_opt_in() {
        let c = config(&["--year", "2025", "--fallback-month", "10"]);
        assert_eq!(c.dates.month_fallback, MonthFallback::Substitute(10));
    }

    #[test]
    fn fallback_month_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["irun_calendar", "--fallback-month", "13"]).is_err());
    }
}
