use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::entry::{self, visible_text};
use super::{ExtractError, RaceRecord};
use crate::dates::{self, DateContext, DateRange};

const DAY_CONTAINER: &str = ".inner-post-entry.entry-content";
const MONTH_CONTAINER: &str = "#penci-post-entry-inner";
const FLAT_CONTAINER: &str = "ul";

static DAY_CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(DAY_CONTAINER).unwrap());
static MONTH_CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(MONTH_CONTAINER).unwrap());
static FLAT_CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(FLAT_CONTAINER).unwrap());
static DAY_NODES_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4, ul").unwrap());
static MONTH_NODES_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, p").unwrap());
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4").unwrap());
static PARAGRAPH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static STRONG_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static FLAT_ENTRY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul li").unwrap());

const WEEKDAYS: &[&str] = &[
    "Κυριακή",
    "Δευτέρα",
    "Τρίτη",
    "Τετάρτη",
    "Πέμπτη",
    "Παρασκευή",
    "Σάββατο",
];

/// The page structures the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `h4` day headings ("Κυριακή 4 Ιανουαρίου 2026"), each followed by a `ul` of races.
    DayHeadings,
    /// `h2` month sections; a `p > strong` date line followed by one `p` per race.
    MonthSections,
    /// A flat `ul > li` list where every race carries its own `DD/MM/YYYY`.
    FlatList,
}

/// Date governing the entries that follow a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// No heading yet, or a section break cleared it. Entries are dropped.
    Unset,
    /// A heading was seen but did not parse. Entries must date themselves.
    Undated,
    Dated(DateRange),
}

impl Anchor {
    fn from_heading(text: &str, ctx: &DateContext) -> Self {
        match dates::normalize(text, ctx) {
            Some(range) => Anchor::Dated(range),
            None => {
                debug!(heading = text, "date heading did not parse");
                Anchor::Undated
            }
        }
    }

    fn resolve(&self, entry_text: &str, ctx: &DateContext) -> Option<DateRange> {
        match self {
            Anchor::Unset => None,
            Anchor::Dated(range) => Some(dates::parse_multi_day(entry_text, ctx).unwrap_or(*range)),
            Anchor::Undated => dates::normalize(entry_text, ctx),
        }
    }
}

impl Layout {
    /// Work out the page structure, checking each container against its own contents.
    pub fn detect(document: &Html) -> Option<Layout> {
        if let Some(content) = document.select(&DAY_CONTAINER_SEL).next() {
            let has_day_heading = content
                .select(&HEADING_SEL)
                .any(|h| is_day_heading(&visible_text(h)));
            if has_day_heading {
                return Some(Layout::DayHeadings);
            }
        }

        if let Some(content) = document.select(&MONTH_CONTAINER_SEL).next() {
            let has_date_line = content
                .select(&PARAGRAPH_SEL)
                .filter_map(|p| p.select(&STRONG_SEL).next())
                .any(|s| dates::has_year_token(&visible_text(s)));
            if has_date_line {
                return Some(Layout::MonthSections);
            }
        }

        let ctx = DateContext::new(0);
        let has_dated_item = document
            .select(&FLAT_ENTRY_SEL)
            .any(|li| dates::parse_numeric(&visible_text(li), &ctx).is_some());
        has_dated_item.then_some(Layout::FlatList)
    }

    pub fn container_selector(&self) -> &'static str {
        match self {
            Layout::DayHeadings => DAY_CONTAINER,
            Layout::MonthSections => MONTH_CONTAINER,
            Layout::FlatList => FLAT_CONTAINER,
        }
    }

    fn container<'a>(&self, document: &'a Html) -> Result<ElementRef<'a>, ExtractError> {
        let found = match self {
            Layout::DayHeadings => document.select(&DAY_CONTAINER_SEL).next(),
            Layout::MonthSections => document.select(&MONTH_CONTAINER_SEL).next(),
            Layout::FlatList => document
                .select(&FLAT_CONTAINER_SEL)
                .next()
                .map(|_| document.root_element()),
        };
        found.ok_or(ExtractError::ContainerMissing {
            layout: *self,
            selector: self.container_selector(),
        })
    }

    /// Extract every race this layout can find in the document.
    pub fn extract(
        &self,
        document: &Html,
        source_url: &str,
        ctx: &DateContext,
    ) -> Result<Vec<RaceRecord>, ExtractError> {
        let container = self.container(document)?;
        let races = match self {
            Layout::DayHeadings => scan_day_headings(container, source_url, ctx),
            Layout::MonthSections => scan_month_sections(container, source_url, ctx),
            Layout::FlatList => scan_flat_list(container, source_url, ctx),
        };
        Ok(races)
    }
}

fn scan_day_headings(container: ElementRef<'_>, source_url: &str, ctx: &DateContext) -> Vec<RaceRecord> {
    let mut anchor = Anchor::Unset;
    let mut races = Vec::new();

    for node in container.select(&DAY_NODES_SEL) {
        match node.value().name() {
            "h4" => {
                let text = visible_text(node);
                if is_day_heading(&text) {
                    anchor = Anchor::from_heading(&text, ctx);
                }
            }
            "ul" if !is_nested_list(node) => {
                if anchor == Anchor::Unset {
                    debug!("skipping list before the first date heading");
                    continue;
                }
                for item in list_items(node) {
                    races.extend(race_from_entry(item, &anchor, source_url, ctx));
                }
            }
            _ => {}
        }
    }

    races
}

fn scan_month_sections(container: ElementRef<'_>, source_url: &str, ctx: &DateContext) -> Vec<RaceRecord> {
    let mut anchor = Anchor::Unset;
    let mut races = Vec::new();

    for node in container.select(&MONTH_NODES_SEL) {
        // Month header
        if node.value().name() == "h2" {
            anchor = Anchor::Unset;
            continue;
        }

        // Date line
        if let Some(strong) = node.select(&STRONG_SEL).next() {
            let text = visible_text(strong);
            if dates::has_year_token(&text) {
                anchor = Anchor::from_heading(&text, ctx);
                continue;
            }
        }

        // Race line; plain prose paragraphs carry no link
        if anchor == Anchor::Unset || node.select(&LINK_SEL).next().is_none() {
            continue;
        }
        races.extend(race_from_entry(node, &anchor, source_url, ctx));
    }

    races
}

fn scan_flat_list(container: ElementRef<'_>, source_url: &str, ctx: &DateContext) -> Vec<RaceRecord> {
    container
        .select(&FLAT_ENTRY_SEL)
        .filter_map(|li| race_from_entry(li, &Anchor::Undated, source_url, ctx))
        .collect()
}

fn race_from_entry(
    entry: ElementRef<'_>,
    anchor: &Anchor,
    source_url: &str,
    ctx: &DateContext,
) -> Option<RaceRecord> {
    let text = entry::own_text(entry);

    let Some(title) = entry::resolve_title(entry) else {
        debug!(entry = %text, "dropping entry without a title");
        return None;
    };
    let Some(range) = anchor.resolve(&text, ctx) else {
        debug!(entry = %text, "dropping entry without a date");
        return None;
    };

    let url = entry::resolve_url(entry, &title, source_url);
    Some(RaceRecord {
        title: title.text,
        start_date: range.start,
        end_date: range.end,
        location: entry::resolve_location(&text),
        url,
    })
}

fn is_day_heading(text: &str) -> bool {
    let folded = dates::fold_greek(text);
    WEEKDAYS
        .iter()
        .any(|day| folded.contains(&dates::fold_greek(day)))
        || dates::has_year_token(text)
}

fn is_nested_list(list: ElementRef<'_>) -> bool {
    list.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "li")
}

fn list_items<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "li")
}

// ── Tests ──
