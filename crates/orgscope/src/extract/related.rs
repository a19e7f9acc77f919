//! "Similar pages" cards linked from the profile.
//!
//! Each anchor whose target carries the `trk=similar-pages` marker becomes
//! one [`RelatedEntity`]. The card layout is read first; when the card has
//! no heading, the anchor text is segmented as
//! `name [| industry] [| location]`, and as a last resort the whole text is
//! the name. The segmentation is a heuristic: names that contain `|` or `-`
//! can be split in the wrong place.

use super::strategy::{first_success, Strategy};
use super::{clean_text, element_text, Page};
use crate::record::RelatedEntity;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Tracking marker identifying related-company links.
pub const RELATION_MARKER: &str = "trk=similar-pages";

pub const NO_NAME: &str = "No name";
pub const NO_INDUSTRY: &str = "No industry";

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!(r#"a[href*="{RELATION_MARKER}"]"#)).expect("anchor selector is valid")
});
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("heading selector is valid"));
static SUBTITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p.base-aside-card__subtitle").expect("subtitle selector is valid")
});
static SECOND_SUBTITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p.base-aside-card__second-subtitle").expect("second subtitle selector is valid")
});
static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w ,&\-'’]+)(?:\s*(?:\||-)\s*([\w ,&\-'’]+))?(?:\s*(?:\||-)\s*(.+))?")
        .expect("segment regex is valid")
});

/// Name, industry and location read from one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardParts {
    pub name: String,
    pub industry: Option<String>,
    pub location: Option<String>,
}

/// All related entities of the page, in document order, duplicates kept.
pub fn extract_related_entities(page: &Page<'_>) -> Vec<RelatedEntity> {
    page.dom.select(&ANCHOR_SELECTOR).map(related_from_anchor).collect()
}

/// Build one entity from a marked anchor.
pub fn related_from_anchor(anchor: ElementRef<'_>) -> RelatedEntity {
    let href = anchor.value().attr("href").unwrap_or_default();
    let chain: [Strategy<ElementRef<'_>, CardParts>; 3] = [
        Strategy::new("card_layout", parts_from_card),
        Strategy::new("segmented_text", parts_from_segments),
        Strategy::new("stripped_text", parts_from_stripped_text),
    ];

    let parts = first_success(&anchor, &chain).map(|(_, parts)| parts);
    let (name, industry, location) = match parts {
        Some(p) => (p.name, p.industry, p.location),
        None => (NO_NAME.to_string(), None, None),
    };

    RelatedEntity {
        name,
        industry: industry.unwrap_or_else(|| NO_INDUSTRY.to_string()),
        location: location.unwrap_or_default(),
        url: canonical_url(href),
    }
}

/// Link target without its query string.
pub fn canonical_url(href: &str) -> String {
    href.split('?').next().unwrap_or_default().to_string()
}

fn select_text(anchor: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    anchor.select(selector).next().map(|el| element_text(&el))
}

/// Heading for the name, first and second subtitles for industry/location.
fn parts_from_card(anchor: &ElementRef<'_>) -> Option<CardParts> {
    let name = select_text(anchor, &HEADING_SELECTOR).filter(|n| !n.is_empty())?;
    Some(CardParts {
        name,
        industry: select_text(anchor, &SUBTITLE_SELECTOR),
        location: select_text(anchor, &SECOND_SUBTITLE_SELECTOR),
    })
}

/// `name [sep industry] [sep location]` over the anchor's inline text.
fn parts_from_segments(anchor: &ElementRef<'_>) -> Option<CardParts> {
    segment(&element_text(anchor))
}

/// Segment already-cleaned text.
pub fn segment(text: &str) -> Option<CardParts> {
    let caps = SEGMENT_RE.captures(text)?;
    let group = |i: usize| {
        caps.get(i)
            .map(|m| clean_text(m.as_str()))
            .filter(|s| !s.is_empty())
    };
    Some(CardParts {
        name: group(1)?,
        industry: group(2),
        location: group(3),
    })
}

/// The whole collapsed text as the name.
fn parts_from_stripped_text(anchor: &ElementRef<'_>) -> Option<CardParts> {
    let name = element_text(anchor);
    (!name.is_empty()).then_some(CardParts {
        name,
        industry: None,
        location: None,
    })
}
