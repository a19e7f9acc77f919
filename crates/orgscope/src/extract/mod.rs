//! Layered extraction from a fetched profile page.
//!
//! The structured path reads the embedded JSON-LD graph; the markup path
//! reads positional patterns from the raw HTML. Both are synchronous because
//! the `scraper` DOM types are `!Send`: async callers should run
//! [`extract_record`] inside `tokio::task::spawn_blocking`.

pub mod fields;
pub mod publications;
pub mod related;
pub mod strategy;
pub mod structured;

use crate::record::EntityRecord;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

pub use fields::extract_company_info;
pub use publications::extract_publications;
pub use related::extract_related_entities;
pub use structured::{PrimaryEntity, StructuredGraph};

/// Extraction failures that abort the whole record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The JSON-LD block exists but is not valid JSON.
    #[error("Invalid JSON-LD format")]
    MalformedContent(String),

    /// No `Organization` node in the graph.
    #[error("Company data not found")]
    EntityNotFound,
}

/// A fetched page: the raw markup and its parsed DOM.
pub struct Page<'a> {
    pub raw: &'a str,
    pub dom: Html,
}

impl<'a> Page<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            dom: Html::parse_document(raw),
        }
    }
}

/// Run the full pipeline over one fetched document.
///
/// `final_url` is the URL after redirects; it becomes the record's
/// `company_linkedin_url`.
pub fn extract_record(html: &str, final_url: &str) -> Result<EntityRecord, ExtractionError> {
    let page = Page::parse(html);
    let graph = StructuredGraph::from_page(&page)?;
    let entity = graph.primary_entity()?;

    Ok(EntityRecord {
        company_info: extract_company_info(&page, &entity, final_url),
        recent_publications: extract_publications(&graph),
        similar_companies: extract_related_entities(&page),
    })
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));

/// Remove every `<...>` tag from a markup fragment.
pub(crate) fn strip_markup(fragment: &str) -> String {
    TAG_RE.replace_all(fragment, "").into_owned()
}

/// Drop empty-comment artifacts and collapse runs of whitespace.
pub(crate) fn clean_text(text: &str) -> String {
    text.replace("<!---->", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of an element, cleaned.
pub(crate) fn element_text(el: &scraper::ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}
