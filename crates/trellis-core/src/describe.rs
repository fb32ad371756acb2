use std::fmt::Write;

use serde::Serialize;

use crate::catalog::CatalogItem;
use crate::criteria::SearchCriteria;
use crate::node::Shape;

/// Flat, printable snapshot of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub kind: String,
    pub shape: Shape,
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<SearchCriteria>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,
}

impl NodeRecord {
    /// Record for a leaf that exists only for the duration of a traversal.
    pub fn computed_leaf(item: &CatalogItem) -> Self {
        Self {
            kind: "product".to_string(),
            shape: Shape::Leaf,
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            children: Vec::new(),
            criteria: None,
            computed: true,
        }
    }
}

pub fn format_record(record: &NodeRecord) -> String {
    let mut line = format!("{} {} \"{}\"", record.kind, record.id, record.name);
    if !record.description.is_empty() {
        let _ = write!(line, " - {}", record.description);
    }
    if record.computed {
        line.push_str(" (computed)");
    }
    if !record.children.is_empty() {
        let _ = write!(line, " -> [{}]", record.children.join(", "));
    }
    if let Some(criteria) = &record.criteria {
        let _ = write!(line, " where {}", format_criteria(criteria));
    }
    line
}

/// One record per line, each prefixed by `indent` spaces.
pub fn format_records(records: &[NodeRecord], indent: usize) -> String {
    let pad = " ".repeat(indent);
    records
        .iter()
        .map(|r| format!("{pad}{}\n", format_record(r)))
        .collect()
}

pub fn format_criteria(criteria: &SearchCriteria) -> String {
    let mut parts = Vec::new();
    if !criteria.categories.is_empty() {
        parts.push(format!("categories={}", join(&criteria.categories)));
    }
    if let Some(text) = criteria.text_fragment() {
        parts.push(format!("text~{text:?}"));
    }
    if let Some(rating) = criteria.min_rating {
        parts.push(format!("rating>={rating}"));
    }
    if let Some(price) = criteria.max_price {
        parts.push(format!("price<={price}"));
    }
    if !criteria.languages.is_empty() {
        parts.push(format!("languages={}", join(&criteria.languages)));
    }
    if let Some(country) = criteria.country() {
        parts.push(format!("country={country}"));
    }
    if let Some(device) = criteria.device() {
        parts.push(format!("device={device}"));
    }
    if !criteria.content_types.is_empty() {
        parts.push(format!("types={}", join(&criteria.content_types)));
    }

    if parts.is_empty() {
        "any".to_string()
    } else {
        parts.join(" ")
    }
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
