//! Recent posts from the JSON-LD graph.

use super::structured::StructuredGraph;
use crate::record::Publication;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// JSON-LD type of a post node.
pub const POST_TYPE: &str = "DiscussionForumPosting";

pub const NO_TEXT: &str = "No text";
pub const NO_URL: &str = "No URL";

/// Every post node in graph order.
pub fn extract_publications(graph: &StructuredGraph) -> Vec<Publication> {
    graph.nodes_of_type(POST_TYPE).map(parse_post).collect()
}

fn parse_post(post: &Value) -> Publication {
    let published = post.get("datePublished").and_then(|d| d.as_str());
    let date = published.and_then(parse_post_date);
    if date.is_none() {
        warn!(value = ?published, "unparsable post timestamp");
    }

    let text = post
        .get("text")
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_TEXT)
        .to_string();

    let url = post
        .get("mainEntityOfPage")
        .and_then(|p| {
            p.as_str()
                .or_else(|| p.get("@id").and_then(|id| id.as_str()))
        })
        .filter(|u| !u.is_empty())
        .unwrap_or(NO_URL)
        .to_string();

    Publication { date, text, url }
}

/// Calendar day (UTC) of a post timestamp.
///
/// Accepts RFC 3339, a date-time without offset (read as UTC), or a bare
/// `YYYY-MM-DD` date.
pub fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
