pub mod entry;
pub mod layout;

use chrono::NaiveDate;
use scraper::Html;
use thiserror::Error;
use tracing::debug;

use crate::dates::DateContext;
pub use layout::Layout;

/// One race, ready for the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceRecord {
    pub title: String,
    pub start_date: NaiveDate,
    /// Inclusive last day of a multi-day race.
    pub end_date: Option<NaiveDate>,
    pub location: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("content container `{selector}` not found for {layout:?} layout")]
    ContainerMissing {
        layout: Layout,
        selector: &'static str,
    },
    #[error("page matches no known calendar layout")]
    NoLayout,
}

/// Markup → layout → race records. `layout` forces a layout instead of probing.
pub fn process_page(
    markup: &str,
    source_url: &str,
    layout: Option<Layout>,
    ctx: &DateContext,
) -> Result<Vec<RaceRecord>, ExtractError> {
    let document = Html::parse_document(markup);
    let layout = match layout {
        Some(forced) => forced,
        None => Layout::detect(&document).ok_or(ExtractError::NoLayout)?,
    };
    debug!(?layout, source_url, "extracting races");
    layout.extract(&document, source_url, ctx)
}

// ── Tests ──
