//! Company attributes from the organization node and the page markup.
//!
//! Every field degrades to its own default; nothing here can fail the
//! record. Fields the JSON-LD node does not carry (founding year,
//! specialties, industry, headquarters) are read from the `<dt>/<dd>`
//! definition list of the "About" section.

use super::strategy::{first_success, Strategy};
use super::structured::PrimaryEntity;
use super::{element_text, strip_markup, Page};
use crate::record::{CompanyAddress, CompanyInfo};
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Separator used to build `full_address`.
pub const ADDRESS_SEPARATOR: &str = ", ";

const LABEL_FOUNDED: &str = "Founded";
const LABEL_SPECIALTIES: &str = "Specialties";
const LABEL_INDUSTRY: &str = "Industry";
const LABEL_HEADQUARTERS: &str = "Headquarters";

static FOLLOWERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,.]*)\s+followers").expect("followers regex is valid")
});

static FIRST_SUBLINE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h3.top-card-layout__first-subline").expect("subline selector is valid")
});

static DT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("dt selector is valid"));

/// Input shared by the field strategies.
pub struct FieldSource<'p, 'a> {
    pub page: &'p Page<'a>,
    pub entity: &'p PrimaryEntity<'p>,
}

/// A label looked up in the page's definition lists.
pub struct LabelQuery<'p, 'a> {
    pub page: &'p Page<'a>,
    pub label: &'static str,
}

/// Derive the company section of the record.
pub fn extract_company_info(page: &Page<'_>, entity: &PrimaryEntity<'_>, final_url: &str) -> CompanyInfo {
    let founded_text = labeled_value(page, LABEL_FOUNDED);

    CompanyInfo {
        company_name: entity.text("name").unwrap_or_default().to_string(),
        company_slogan: entity.text("slogan").unwrap_or_default().to_string(),
        company_website: entity.website().unwrap_or_default().to_string(),
        company_linkedin_url: final_url.to_string(),
        founded_year: founded_text.as_deref().and_then(parse_year),
        specialties: labeled_value(page, LABEL_SPECIALTIES).unwrap_or_default(),
        industry: labeled_value(page, LABEL_INDUSTRY).unwrap_or_default(),
        headquarters: labeled_value(page, LABEL_HEADQUARTERS).unwrap_or_default(),
        company_address: extract_address(entity),
        company_description: entity.text("description").unwrap_or_default().to_string(),
        number_of_employees: entity
            .employee_count()
            .cloned()
            .unwrap_or_else(|| Value::String(String::new())),
        followers: extract_followers(page, entity),
    }
}

/// Address parts from the organization node plus the joined form.
pub fn extract_address(entity: &PrimaryEntity<'_>) -> CompanyAddress {
    let part = |key: &str| entity.address_part(key).unwrap_or_default().to_string();
    let street_address = part("streetAddress");
    let address_locality = part("addressLocality");
    let postal_code = part("postalCode");
    let country = part("addressCountry");

    let full_address = [&street_address, &address_locality, &postal_code, &country]
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(ADDRESS_SEPARATOR);

    CompanyAddress {
        full_address,
        street_address,
        address_locality,
        postal_code,
        country,
    }
}

// ── Followers ───────────────────────────────────────────────────────────────

/// Follower count, digits only, `"0"` when nothing matches.
pub fn extract_followers(page: &Page<'_>, entity: &PrimaryEntity<'_>) -> String {
    let source = FieldSource { page, entity };
    let chain: [Strategy<FieldSource<'_, '_>, String>; 3] = [
        Strategy::new("author_subtitle", followers_from_subtitle),
        Strategy::new("top_card_subline", followers_from_subline),
        Strategy::new("document_text", followers_from_document),
    ];
    first_success(&source, &chain)
        .map(|(_, count)| count)
        .unwrap_or_else(|| "0".to_string())
}

fn followers_from_subtitle(src: &FieldSource<'_, '_>) -> Option<String> {
    let digits: String = src
        .entity
        .text("authorSubtitle")?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then_some(digits)
}

fn followers_from_subline(src: &FieldSource<'_, '_>) -> Option<String> {
    let heading = src.page.dom.select(&FIRST_SUBLINE).next()?;
    followers_in(&element_text(&heading))
}

fn followers_from_document(src: &FieldSource<'_, '_>) -> Option<String> {
    followers_in(src.page.raw)
}

fn followers_in(text: &str) -> Option<String> {
    let caps = FOLLOWERS_RE.captures(text)?;
    Some(caps[1].replace(',', ""))
}

// ── Definition-list labels ─────────────────────────────────────────────────

/// Value paired with `label` in a `<dt>/<dd>` list, markup stripped.
pub fn labeled_value(page: &Page<'_>, label: &'static str) -> Option<String> {
    let query = LabelQuery { page, label };
    let chain: [Strategy<LabelQuery<'_, '_>, String>; 2] = [
        Strategy::new("definition_list", label_from_definition_list),
        Strategy::new("raw_pattern", label_from_raw_pattern),
    ];
    let found = first_success(&query, &chain).map(|(_, value)| value);
    if found.is_none() {
        debug!(label, "label not found, using default");
    }
    found
}

/// Walk the DOM: the `<dd>` following a `<dt>` whose text is the label.
fn label_from_definition_list(q: &LabelQuery<'_, '_>) -> Option<String> {
    let dt = q
        .page
        .dom
        .select(&DT_SELECTOR)
        .find(|dt| element_text(dt).eq_ignore_ascii_case(q.label))?;
    let dd = dt
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")?;
    let value = dd.text().collect::<String>().trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Positional regex over the raw markup, for lists the DOM walk misses.
fn label_from_raw_pattern(q: &LabelQuery<'_, '_>) -> Option<String> {
    let pattern = format!(
        r"(?is)<dt[^>]*>\s*{}\s*</dt>.*?<dd[^>]*>(.*?)</dd>",
        regex::escape(q.label)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(q.page.raw)?;
    let value = strip_markup(&caps[1]).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Integer value of the leading digits, `None` if there are none.
pub fn parse_year(text: &str) -> Option<i32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
