use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static GREEK_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s+(\p{Greek}+)(?:\s+(\d{4})\b)?").unwrap()
});
static NUMERIC_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static PAREN_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());
static DAY_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*-\s*(\d{1,2})\s*/\s*([^\s,/()]+)").unwrap()
});
static DATE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}(?:\s*-\s*\d{1,2})?\s*/\s*[^\s/]+(?:\s*/\s*\d{2,4})?$").unwrap()
});
static YEAR_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Genitive month names as they appear in headings ("4 Ιανουαρίου 2026").
const GREEK_MONTHS: [&str; 12] = [
    "Ιανουαρίου",
    "Φεβρουαρίου",
    "Μαρτίου",
    "Απριλίου",
    "Μαΐου",
    "Ιουνίου",
    "Ιουλίου",
    "Αυγούστου",
    "Σεπτεμβρίου",
    "Οκτωβρίου",
    "Νοεμβρίου",
    "Δεκεμβρίου",
];

/// What to do with a day range whose month token is not a number ("25-26/Οκτ").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFallback {
    #[default]
    Reject,
    Substitute(u32),
}

/// Values a run supplies to the normalizer; nothing here is inferred from page text.
#[derive(Debug, Clone, Copy)]
pub struct DateContext {
    pub year: i32,
    pub month_fallback: MonthFallback,
}

impl DateContext {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            month_fallback: MonthFallback::Reject,
        }
    }
}

/// Canonical date model: a whole day, or an inclusive span of whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn single(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// `None` for inverted spans.
    pub fn span(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self {
            start,
            end: Some(end),
        })
    }
}

type DateForm = fn(&str, &DateContext) -> Option<DateRange>;

/// Recognized forms, highest priority first.
const DATE_FORMS: &[DateForm] = &[parse_greek, parse_numeric, parse_multi_day];

/// Normalize free text into a date range. The first form that matches wins.
pub fn normalize(text: &str, ctx: &DateContext) -> Option<DateRange> {
    DATE_FORMS.iter().find_map(|form| form(text, ctx))
}

/// "Κυριακή 4 Ιανουαρίου 2026" → 2026-01-04. A missing year falls back to `ctx.year`.
pub fn parse_greek(text: &str, ctx: &DateContext) -> Option<DateRange> {
    GREEK_DATE_RE.captures_iter(text).find_map(|caps| {
        let month = greek_month_number(&caps[2])?;
        let day: u32 = caps[1].parse().ok()?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().parse().ok()?,
            None => ctx.year,
        };
        NaiveDate::from_ymd_opt(year, month, day).map(DateRange::single)
    })
}

/// "05/04/2026" → 2026-04-05.
pub fn parse_numeric(text: &str, _ctx: &DateContext) -> Option<DateRange> {
    let caps = NUMERIC_DATE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(DateRange::single)
}

/// "(Athens, 25-26/10)" → 25..26 October of `ctx.year`. Only looks inside parentheses.
pub fn parse_multi_day(text: &str, ctx: &DateContext) -> Option<DateRange> {
    PAREN_GROUP_RE
        .captures_iter(text)
        .find_map(|group| DAY_RANGE_RE.captures(group.get(1)?.as_str()))
        .and_then(|caps| {
            let first: u32 = caps[1].parse().ok()?;
            let last: u32 = caps[2].parse().ok()?;
            if first > last {
                return None;
            }
            let month = match caps[3].parse::<u32>() {
                Ok(m) => m,
                Err(_) => match ctx.month_fallback {
                    MonthFallback::Reject => return None,
                    MonthFallback::Substitute(m) => m,
                },
            };
            let start = NaiveDate::from_ymd_opt(ctx.year, month, first)?;
            let end = NaiveDate::from_ymd_opt(ctx.year, month, last)?;
            DateRange::span(start, end)
        })
}

/// True for bare date fragments such as "05/04/2026", "25-26/10" or "4/5".
pub fn is_date_token(text: &str) -> bool {
    DATE_TOKEN_RE.is_match(text.trim())
}

pub fn has_year_token(text: &str) -> bool {
    YEAR_TOKEN_RE.is_match(text)
}

/// Lowercase and strip tonos and dialytika so "ΜΑΙΟΥ", "ΜΑΪΟΥ", "Μαΐου" and "μαιου" compare equal.
pub fn fold_greek(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .map(|c| match c {
            'ά' => 'α',
            'έ' => 'ε',
            'ή' => 'η',
            'ί' => 'ι',
            'ό' => 'ο',
            'ύ' => 'υ',
            'ώ' => 'ω',
            'ΐ' | 'ϊ' => 'ι',
            'ΰ' | 'ϋ' => 'υ',
            other => other,
        })
        .collect()
}

fn greek_month_number(token: &str) -> Option<u32> {
    let folded = fold_greek(token);
    GREEK_MONTHS
        .iter()
        .position(|m| fold_greek(m) == folded)
        .map(|i| i as u32 + 1)
}

// ── Tests ──
