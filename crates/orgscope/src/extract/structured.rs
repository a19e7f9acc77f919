//! Parse the embedded JSON-LD block into a node graph.
//!
//! Only the first `<script type="application/ld+json">` element is read.
//! A page without one yields an empty graph; a block that is not valid JSON
//! is an error because the rest of the pipeline depends on it.

use super::{ExtractionError, Page};
use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;

/// JSON-LD type of the primary entity.
pub const ORGANIZATION_TYPE: &str = "Organization";

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("json-ld selector is valid")
});

/// Ordered JSON-LD nodes from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredGraph {
    nodes: Vec<Value>,
}

impl StructuredGraph {
    /// Locate and parse the first JSON-LD block of a parsed page.
    pub fn from_page(page: &Page<'_>) -> Result<Self, ExtractionError> {
        let Some(script) = page.dom.select(&JSONLD_SELECTOR).next() else {
            return Ok(Self::default());
        };
        let text = script.text().collect::<String>();
        Self::from_json_ld(&text)
    }

    /// Locate and parse the first JSON-LD block of raw HTML.
    pub fn from_document(html: &str) -> Result<Self, ExtractionError> {
        Self::from_page(&Page::parse(html))
    }

    /// Parse the content of a JSON-LD block.
    pub fn from_json_ld(text: &str) -> Result<Self, ExtractionError> {
        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| ExtractionError::MalformedContent(e.to_string()))?;
        Ok(Self::from_value(value))
    }

    /// Build a graph from an already-parsed JSON-LD document.
    ///
    /// `@graph` arrays are flattened; a top-level array contributes its
    /// elements; a single typed object is a one-node graph.
    pub fn from_value(value: Value) -> Self {
        let nodes = match value {
            Value::Object(mut obj) => match obj.remove("@graph") {
                Some(Value::Array(items)) => items,
                Some(_) => Vec::new(),
                None if obj.contains_key("@type") => vec![Value::Object(obj)],
                None => Vec::new(),
            },
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Value] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes declaring `ld_type`, in document order.
    pub fn nodes_of_type<'a>(&'a self, ld_type: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.nodes.iter().filter(move |n| has_type(n, ld_type))
    }

    /// The first `Organization` node.
    pub fn primary_entity(&self) -> Result<PrimaryEntity<'_>, ExtractionError> {
        self.nodes_of_type(ORGANIZATION_TYPE)
            .next()
            .map(PrimaryEntity::new)
            .ok_or(ExtractionError::EntityNotFound)
    }
}

/// Whether a node's `@type` (string or array of strings) includes `ld_type`.
pub fn has_type(node: &Value, ld_type: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == ld_type,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(ld_type)),
        _ => false,
    }
}

/// Read-only view over the selected organization node.
///
/// Accessors never fail: wrongly typed or missing properties read as absent.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryEntity<'a> {
    node: &'a Value,
}

impl<'a> PrimaryEntity<'a> {
    pub fn new(node: &'a Value) -> Self {
        Self { node }
    }

    pub fn raw(&self) -> &'a Value {
        self.node
    }

    /// A top-level string property.
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.node.get(key).and_then(|v| v.as_str())
    }

    /// A string property of the `address` sub-object.
    pub fn address_part(&self, key: &str) -> Option<&'a str> {
        self.node
            .get("address")
            .and_then(|a| a.get(key))
            .and_then(|v| v.as_str())
    }

    /// `sameAs`, or its first entry when it is a list.
    pub fn website(&self) -> Option<&'a str> {
        self.node.get("sameAs").and_then(|s| {
            s.as_str()
                .or_else(|| s.as_array().and_then(|a| a.first()).and_then(|v| v.as_str()))
        })
    }

    /// `numberOfEmployees.value` as published, number or string alike.
    /// An explicit `null` reads as absent.
    pub fn employee_count(&self) -> Option<&'a Value> {
        self.node
            .get("numberOfEmployees")?
            .get("value")
            .filter(|v| !v.is_null())
    }
}
