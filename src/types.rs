use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Competitor classification bucket. The declaration order is not load
/// bearing; cross-category ownership is decided by `priority()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Incumbent,
    Regional,
    Interesting,
    Graveyard,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Incumbent,
        Category::Regional,
        Category::Interesting,
        Category::Graveyard,
    ];

    /// Dedup priority: lower number wins when the same entity shows up in
    /// more than one category.
    pub fn priority(&self) -> u8 {
        match self {
            Category::Incumbent => 1,
            Category::Regional => 2,
            Category::Interesting => 3,
            Category::Graveyard => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Incumbent => write!(f, "incumbent"),
            Category::Regional => write!(f, "regional"),
            Category::Interesting => write!(f, "interesting"),
            Category::Graveyard => write!(f, "graveyard"),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "regional" => Category::Regional,
            "interesting" => Category::Interesting,
            "graveyard" => Category::Graveyard,
            _ => Category::Incumbent,
        }
    }
}

/// One (model, category) query attempt, success or failure. Immutable once
/// the orchestrator hands it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub source_id: String,
    pub category: Category,
    pub content: Option<String>,
    pub error: Option<String>,
    pub elapsed_seconds: f64,
}

/// A single source's item list for one category. Items are in the order the
/// model emitted them; after normalization the same canonical label may
/// appear more than once, the ranker collapses that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceList {
    pub source_id: String,
    pub category: Category,
    pub items: Vec<String>,
    pub error: Option<String>,
    pub elapsed_seconds: f64,
}

impl SourceList {
    /// Derive an item list from a raw query response.
    pub fn from_response(response: &ModelResponse) -> Self {
        let items = response
            .content
            .as_deref()
            .map(crate::parser::parse_numbered_list)
            .unwrap_or_default();

        SourceList {
            source_id: response.source_id.clone(),
            category: response.category,
            items,
            error: response.error.clone(),
            elapsed_seconds: response.elapsed_seconds,
        }
    }
}

/// Mapping from raw item label to canonical label, as returned by the
/// normalizer model. Labels the model omitted self-map implicitly: the
/// lookup falls back to the original label instead of pre-populating every
/// possible key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationMap {
    entries: HashMap<String, String>,
}

impl NormalizationMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        NormalizationMap { entries }
    }

    /// Canonical form of a label; identity when the normalizer left it out.
    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        let trimmed = label.trim();
        self.entries
            .get(trimmed)
            .map(String::as_str)
            .unwrap_or(trimmed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of a ranked short list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub rank: usize,
    pub label: String,
    /// Number of distinct sources that produced this entity.
    pub frequency: usize,
    /// Contributing sources, sorted for stable display.
    pub sources: Vec<String>,
}

/// Precision/recall against a user-supplied control set. Values stay full
/// precision internally; percentage rounding is presentation only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub per_source_precision: std::collections::BTreeMap<String, f64>,
    pub per_source_recall: std::collections::BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_priority_order() {
        assert!(Category::Incumbent.priority() < Category::Regional.priority());
        assert!(Category::Regional.priority() < Category::Interesting.priority());
        assert!(Category::Interesting.priority() < Category::Graveyard.priority());
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from(category.to_string().as_str()), category);
        }
    }

    #[test]
    fn test_normalization_map_identity_fallback() {
        let mut entries = HashMap::new();
        entries.insert("Facebook".to_string(), "Meta Platforms Inc.".to_string());
        let map = NormalizationMap::new(entries);

        assert_eq!(map.canonical("Facebook"), "Meta Platforms Inc.");
        // Omitted labels map to themselves, trimmed.
        assert_eq!(map.canonical(" Waymo "), "Waymo");
    }
}
