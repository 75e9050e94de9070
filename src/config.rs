use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::types::Category;

/// Full catalog of model endpoints queried in deep mode.
pub const SOURCE_CATALOG: [&str; 8] = [
    "openai/gpt-4o-search-preview",
    "anthropic/claude-3.7-sonnet",
    "x-ai/grok-3-mini-beta",
    "cohere/command-r7b-12-2024",
    "meta-llama/llama-4-scout",
    "nvidia/llama-3.1-nemotron-ultra-253b-v1:free",
    "perplexity/sonar-pro",
    "google/gemma-3-27b-it",
];

/// Smaller subset used in fast mode.
pub const FAST_MODE_SOURCES: [&str; 6] = [
    "cohere/command-r7b-12-2024",
    "meta-llama/llama-4-scout",
    "perplexity/sonar-pro",
    "openai/gpt-4o-search-preview",
    "anthropic/claude-3.7-sonnet",
    "google/gemma-3-27b-it",
];

/// Model used for the single batch normalization call.
pub const NORMALIZER_MODEL: &str = "google/gemini-2.5-pro-exp-03-25:free";

pub const DEFAULT_LONG_LIST_SIZE: usize = 20;
pub const DEFAULT_SHORT_LIST_SIZE: usize = 10;
pub const DEFAULT_SECONDARY_LIST_SIZE: usize = 5;
pub const SECONDARY_LONG_LIST_SIZE: usize = 10;

/// Sampling temperature for the fan-out list queries.
pub const QUERY_TEMPERATURE: f32 = 0.7;
/// Lower temperature for normalization, which should be as stable as possible.
pub const NORMALIZER_TEMPERATURE: f32 = 0.2;

pub const QUERY_MAX_TOKENS: u32 = 2048;
pub const NORMALIZER_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    Fast,
    Deep,
}

/// Session-level knobs for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Size of the long list requested from each source for the primary
    /// category.
    pub long_list_size: usize,
    /// Short list size for the primary (incumbent) category.
    pub short_list_size: usize,
    /// Short list size for the secondary categories.
    pub secondary_list_size: usize,
    /// Explicit model selection; empty means "use the mode's catalog".
    pub custom_sources: Vec<String>,
    pub mode: QueryMode,
    /// Enables control-set evaluation and control-set-driven list sizing.
    pub test_mode: bool,
    /// Pins the regional category to an explicit region.
    pub region: Option<String>,
    pub normalizer_model: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            long_list_size: DEFAULT_LONG_LIST_SIZE,
            short_list_size: DEFAULT_SHORT_LIST_SIZE,
            secondary_list_size: DEFAULT_SECONDARY_LIST_SIZE,
            custom_sources: Vec::new(),
            mode: QueryMode::Deep,
            test_mode: false,
            region: None,
            normalizer_model: NORMALIZER_MODEL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// The sources this run will actually query.
    pub fn sources(&self) -> Vec<String> {
        if !self.custom_sources.is_empty() {
            return self.custom_sources.clone();
        }
        match self.mode {
            QueryMode::Fast => FAST_MODE_SOURCES.iter().map(|s| s.to_string()).collect(),
            QueryMode::Deep => SOURCE_CATALOG.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Long-list size requested from each source for a category. Secondary
    /// categories always ask for a fixed smaller list.
    pub fn long_list_size_for(&self, category: Category) -> usize {
        match category {
            Category::Incumbent => self.long_list_size,
            _ => SECONDARY_LONG_LIST_SIZE,
        }
    }

    /// Short-list size for a category after ranking.
    pub fn short_list_size_for(&self, category: Category) -> usize {
        match category {
            Category::Incumbent => self.short_list_size,
            _ => self.secondary_list_size,
        }
    }

    /// In test mode the list sizes track the control set: the short list
    /// matches it exactly and the long list allows 50% headroom.
    pub fn apply_test_mode(&mut self, control_set_size: usize) {
        self.test_mode = true;
        if control_set_size > 0 {
            self.short_list_size = control_set_size;
            self.long_list_size = control_set_size + control_set_size.div_ceil(2);
        }
    }

    /// Fail-fast preconditions, checked before any network activity.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sources().is_empty() {
            return Err(AnalysisError::Configuration(
                "no sources selected; select at least one model".to_string(),
            ));
        }
        if self.short_list_size == 0 || self.secondary_list_size == 0 {
            return Err(AnalysisError::Configuration(
                "short list size must be at least 1".to_string(),
            ));
        }
        if self.long_list_size < self.short_list_size {
            return Err(AnalysisError::Configuration(
                "long list size must not be smaller than the short list size".to_string(),
            ));
        }
        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err(AnalysisError::Configuration(
                    "select a region or omit the region option".to_string(),
                ));
            }
        }
        Ok(())
    }
}
