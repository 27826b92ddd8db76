use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::dates;

pub const UNKNOWN_LOCATION: &str = "Unknown";

static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static EMPHASIS_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("em, i").unwrap());
static PAREN_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

/// A resolved race title, plus the href of the link it came from (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub text: String,
    pub href: Option<String>,
}

type TitleRule = fn(ElementRef<'_>) -> Option<Title>;

/// Title strategies, first non-empty wins.
const TITLE_RULES: &[TitleRule] = &[title_from_link, title_from_emphasis, title_from_text];

/// Visible text of a node with whitespace runs collapsed.
pub fn visible_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of the entry itself, leaving out any list nested inside it.
pub fn own_text(entry: ElementRef<'_>) -> String {
    entry
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            is_own(parent, entry).then_some(&**text)
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// False for elements that sit inside a sub-list of `entry`.
fn is_own(el: ElementRef<'_>, entry: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take_while(|a| a.id() != entry.id())
        .all(|a| !matches!(a.value().name(), "ul" | "ol" | "li"))
}

fn own_links<'a>(entry: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    entry
        .select(&LINK_SEL)
        .filter(|a| is_own(*a, entry))
        .collect()
}

pub fn resolve_title(entry: ElementRef<'_>) -> Option<Title> {
    TITLE_RULES.iter().find_map(|rule| rule(entry))
}

/// Last link with visible text. Leading links are usually "read more" boilerplate.
fn title_from_link(entry: ElementRef<'_>) -> Option<Title> {
    own_links(entry).into_iter().rev().find_map(|a| {
        let text = visible_text(a);
        if text.is_empty() {
            return None;
        }
        Some(Title {
            text,
            href: non_empty_href(a),
        })
    })
}

/// Longest `em`/`i` text; ties keep the earlier one.
fn title_from_emphasis(entry: ElementRef<'_>) -> Option<Title> {
    entry
        .select(&EMPHASIS_SEL)
        .filter(|em| is_own(*em, entry))
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .fold(None::<String>, |best, t| match best {
            Some(b) if b.chars().count() >= t.chars().count() => Some(b),
            _ => Some(t),
        })
        .map(|text| Title { text, href: None })
}

/// Everything before the first "(".
fn title_from_text(entry: ElementRef<'_>) -> Option<Title> {
    let text = own_text(entry);
    let head = text.split('(').next().unwrap_or("").trim();
    if head.is_empty() {
        None
    } else {
        Some(Title {
            text: head.to_string(),
            href: None,
        })
    }
}

/// First comma-separated part of the first "(...)" group that is not itself a date.
///
/// "(Athens, 10k)" → "Athens", "(05/04/2026, Paris, France)" → "Paris".
pub fn resolve_location(text: &str) -> String {
    PAREN_GROUP_RE
        .captures(text)
        .and_then(|caps| {
            caps[1]
                .split(',')
                .map(str::trim)
                .find(|part| !part.is_empty() && !dates::is_date_token(part))
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// The title link's href, else the last non-empty href in the entry, else the page URL.
pub fn resolve_url(entry: ElementRef<'_>, title: &Title, source_url: &str) -> String {
    title
        .href
        .clone()
        .or_else(|| last_href(entry))
        .map(|href| absolutize(&href, source_url))
        .unwrap_or_else(|| source_url.to_string())
}

fn last_href(entry: ElementRef<'_>) -> Option<String> {
    own_links(entry).into_iter().rev().find_map(non_empty_href)
}

fn non_empty_href(a: ElementRef<'_>) -> Option<String> {
    a.value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Absolute hrefs are kept verbatim; relative ones are joined onto the page URL.
fn absolutize(href: &str, base: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => href.to_string(),
    }
}

// ── Tests ──
