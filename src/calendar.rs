use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use icalendar::{Calendar, Component, Event, EventLike};
use tracing::info;

use crate::parser::RaceRecord;

/// iCalendar DTEND is exclusive: a race ending on `last_day` must end the day after.
pub fn exclusive_end(last_day: NaiveDate) -> NaiveDate {
    last_day
        .checked_add_days(Days::new(1))
        .unwrap_or(last_day)
}

pub fn describe(race: &RaceRecord) -> String {
    format!(
        "{}\nLocation: {}\nMore info: {}",
        race.title, race.location, race.url
    )
}

/// All-day event for one race. `index` keeps UIDs distinct for duplicate races.
pub fn race_event(index: usize, race: &RaceRecord) -> Event {
    let mut event = Event::new();
    event
        .uid(&format!(
            "{}-{}@irun-calendar",
            index,
            race.start_date.format("%Y%m%d")
        ))
        .summary(&race.title)
        .starts(race.start_date)
        .location(&race.location)
        .description(&describe(race))
        .add_property("URL", race.url.as_str());

    if let Some(last_day) = race.end_date {
        event.ends(exclusive_end(last_day));
    }

    event.done()
}

/// Every race becomes one event, in input order.
pub fn build_calendar(name: &str, races: &[RaceRecord]) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(name);
    for (index, race) in races.iter().enumerate() {
        calendar.push(race_event(index, race));
    }
    calendar.done()
}

/// Write via a sibling temp file and rename, so a failed write never leaves a partial calendar.
pub fn write_calendar(path: &Path, calendar: &Calendar) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("ics.tmp");
    let written = fs::write(&tmp, calendar.to_string())
        .and_then(|_| fs::rename(&tmp, path))
        .with_context(|| format!("Failed to write {}", path.display()));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written?;

    info!("Wrote {}", path.display());
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn race(title: &str, start: NaiveDate, end: Option<NaiveDate>) -> RaceRecord {
        RaceRecord {
            title: title.to_string(),
            start_date: start,
            end_date: end,
            location: "Athens".to_string(),
            url: "http://x".to_string(),
        }
    }

    fn property_lines(ics: &str, name: &str) -> Vec<String> {
        ics.lines()
            .filter(|l| l.starts_with(name) && l[name.len()..].starts_with([';', ':']))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn exclusive_end_is_next_day() {
        assert_eq!(exclusive_end(ymd(2025, 10, 26)), ymd(2025, 10, 27));
        assert_eq!(exclusive_end(ymd(2025, 12, 31)), ymd(2026, 1, 1));
    }

    #[test]
    fn multi_day_event_ends_after_last_day() {
        let cal = build_calendar(
            "test",
            &[race("Trail", ymd(2025, 10, 25), Some(ymd(2025, 10, 26)))],
        );
        let ics = cal.to_string();

        let starts = property_lines(&ics, "DTSTART");
        assert_eq!(starts.len(), 1);
        assert!(starts[0].ends_with("20251025"), "{}", starts[0]);
        assert!(starts[0].contains("VALUE=DATE"), "{}", starts[0]);

        let ends = property_lines(&ics, "DTEND");
        assert_eq!(ends.len(), 1);
        assert!(ends[0].ends_with("20251027"), "{}", ends[0]);
    }

    #[test]
    fn single_day_event_has_no_end() {
        let cal = build_calendar("test", &[race("Race X", ymd(2026, 1, 4), None)]);
        let ics = cal.to_string();
        assert!(property_lines(&ics, "DTEND").is_empty());
        assert!(property_lines(&ics, "DTSTART")[0].ends_with("20260104"));
    }

    #[test]
    fn event_fields() {
        let cal = build_calendar("test", &[race("Race X", ymd(2026, 1, 4), None)]);
        let ics = cal.to_string();
        assert!(ics.contains("SUMMARY:Race X"));
        assert!(ics.contains("LOCATION:Athens"));
        assert!(ics.contains("URL:http://x"));
        assert!(ics.contains("UID:0-20260104@irun-calendar"));
    }

    #[test]
    fn description_has_three_lines() {
        let r = race("Race X", ymd(2026, 1, 4), None);
        assert_eq!(describe(&r), "Race X\nLocation: Athens\nMore info: http://x");
    }

    #[test]
    fn every_race_is_emitted_in_order() {
        let races = vec![
            race("B", ymd(2026, 5, 1), None),
            race("A", ymd(2026, 1, 1), None),
            race("B", ymd(2026, 5, 1), None),
        ];
        let ics = build_calendar("test", &races).to_string();
        let summaries = property_lines(&ics, "SUMMARY");
        assert_eq!(summaries, vec!["SUMMARY:B", "SUMMARY:A", "SUMMARY:B"]);
        assert_eq!(property_lines(&ics, "BEGIN").iter().filter(|l| l.ends_with("VEVENT")).count(), 3);
    }

    #[test]
    fn writes_file_without_leftover_temp() {
        let dir = std::env::temp_dir().join(format!("irun_calendar_write_{}", std::process::id()));
        let path = dir.join("nested").join("races.ics");
        let cal = build_calendar("test", &[race("Race X", ymd(2026, 1, 4), None)]);

        write_calendar(&path, &cal).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("BEGIN:VCALENDAR"));
        assert!(!path.with_extension("ics.tmp").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = std::env::temp_dir().join(format!("irun_calendar_fail_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let cal = build_calendar("test", &[]);
        let result = write_calendar(&blocker.join("races.ics"), &cal);
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
